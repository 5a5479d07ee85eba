//! Progress snapshot exchanged with the persistence collaborator.
//!
//! The director only produces and consumes [`ProgressSnapshot`] values; how
//! they are encoded and where they live belongs to a [`SnapshotStore`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerState;

/// Saved level and unlock flag of one upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub level: u32,
    pub unlocked: bool,
}

/// Everything that crosses the session boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub credits: u64,
    pub xp: u64,
    pub level: u32,
    pub xp_threshold: u64,
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,
}

impl ProgressSnapshot {
    pub fn ledger(&self) -> LedgerState {
        LedgerState {
            credits: self.credits,
            xp: self.xp,
            level: self.level,
            xp_threshold: self.xp_threshold,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot storage I/O failed")]
    Io(#[from] std::io::Error),

    #[error("snapshot could not be encoded: {0}")]
    Encode(String),

    #[error("snapshot could not be decoded: {0}")]
    Decode(String),
}

/// Load/save boundary owned by the host.
pub trait SnapshotStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError>;
    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError>;
}

/// Keeps the last snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<ProgressSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Option<&ProgressSnapshot> {
        self.saved.as_ref()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        self.saved = Some(snapshot.clone());
        Ok(())
    }
}
