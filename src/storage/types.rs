use serde::Serialize;

/// Physical collections backing one logical dataset.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub enum Slot {
    /// What readers see.
    Live,
    /// Scratch area filled during a run, promoted to live on commit.
    Staging,
    /// Live as it stood when the latest run began.
    Backup,
    /// Lease record guarding against overlapping runs.
    Lock,
}

impl Slot {
    pub fn collection(&self, dataset: &str) -> String {
        match self {
            Slot::Live => dataset.to_string(),
            Slot::Staging => format!("{}_tmp", dataset),
            Slot::Backup => format!("{}_bak", dataset),
            Slot::Lock => format!("{}_lock", dataset),
        }
    }
}
