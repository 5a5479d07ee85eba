//! RON file persistence for progress snapshots.

use std::path::PathBuf;

use progression::{ProgressSnapshot, SnapshotStore, StoreError};

pub struct RonFileStore {
    path: PathBuf,
}

impl RonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for RonFileStore {
    fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        ron::from_str(&data)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("{:?}: {}", self.path, e)))
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        let s = ron::ser::to_string_pretty(snapshot, ron::ser::PrettyConfig::default())
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        std::fs::write(&self.path, s)?;
        log::info!("Saved progress to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progression::NodeSnapshot;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("director-sim-{}-{}.ron", name, std::process::id()))
    }

    #[test]
    fn missing_file_loads_nothing() {
        let mut store = RonFileStore::new(temp_path("missing"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let path = temp_path("roundtrip");
        let snapshot = ProgressSnapshot {
            credits: 420,
            xp: 17,
            level: 3,
            xp_threshold: 225,
            nodes: vec![NodeSnapshot {
                id: "hull_plating".into(),
                level: 2,
                unlocked: true,
            }],
        };
        let mut store = RonFileStore::new(&path);
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn garbage_file_is_a_decode_error() {
        let path = temp_path("garbage");
        std::fs::write(&path, "not a snapshot").unwrap();
        let mut store = RonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Decode(_))));
        let _ = std::fs::remove_file(&path);
    }
}
