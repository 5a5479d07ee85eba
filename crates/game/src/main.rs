//! director-sim - headless session runner for the combat progression director

mod config;
mod session;
mod store;
mod world;

use anyhow::{Context, Result};
use progression::Catalog;

use config::SimConfig;
use session::Session;
use store::RonFileStore;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                          director-sim                            ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  Headless combat session: waves, upgrades, weapons, difficulty   ║");
    println!("║  Settings: director.ron   Catalog: catalog.ron (optional)        ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");

    let config = SimConfig::load();
    config.save();
    let catalog = Catalog::load(&config.catalog_path)
        .with_context(|| format!("loading catalog {:?}", config.catalog_path))?;
    let mut store = RonFileStore::new(config.save_path.clone());
    let session_seconds = config.session_seconds;

    let mut session = Session::new(config, catalog).context("building combat director")?;
    if session.director.load_from(&mut store)? {
        log::info!("Resuming saved progress");
    }

    log::info!("Simulating {:.0}s of combat", session_seconds);
    session.run();
    session.director.save_to(&mut store)?;

    let stats = session.stats();
    let director = &session.director;
    println!();
    println!("Waves completed:  {}", stats.waves_completed);
    println!("Kills:            {}", director.encounter().total_kills());
    println!("Shots / hits:     {} / {}", stats.shots, stats.hits);
    println!("Reloads:          {}", stats.reloads);
    println!("Overheats:        {}", stats.overheats);
    println!("Player deaths:    {}", stats.player_deaths);
    println!("Upgrades bought:  {}", stats.upgrades_bought);
    println!("Credits earned:   {}", stats.credits_earned);
    println!("Credits banked:   {}", director.ledger().credits());
    println!("Level:            {} ({} levels gained)", director.ledger().level(), stats.level_ups);
    println!(
        "Difficulty:       x{:.2} (rating {:.2})",
        director.governor().multiplier(),
        director.governor().rating()
    );
    println!("Hostiles alive:   {}", session.hostiles_alive());
    Ok(())
}
