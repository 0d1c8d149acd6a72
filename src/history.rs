use serde::{Deserialize, Serialize};

use crate::diagnosis::HistoryEntry;
use crate::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl HistoryStatus {
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Client-side filter over the cached history list. Filtering never
/// re-fetches and never reorders; the store's most-recent-first order is
/// kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFilter {
    #[default]
    All,
    Crop(String),
}

impl HistoryFilter {
    #[must_use]
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        match self {
            Self::All => true,
            Self::Crop(crop_type) => entry.crop_type == *crop_type,
        }
    }
}

/// Cached view of the remote history store. The store owns the entries;
/// this is only the copy of the last successful load, so a failed load or
/// delete leaves it untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryState {
    pub status: HistoryStatus,
    pub entries: Vec<HistoryEntry>,
    pub filter: HistoryFilter,
    pub pending_delete: Option<i64>,
    pub error: Option<AppError>,
}

impl HistoryState {
    pub fn begin_loading(&mut self) {
        self.status = HistoryStatus::Loading;
        self.error = None;
    }

    pub fn loaded(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = entries;
        self.status = HistoryStatus::Loaded;
        self.error = None;
    }

    /// Records a failure without discarding what is already on screen.
    pub fn failed(&mut self, error: AppError) {
        self.status = HistoryStatus::Failed;
        self.error = Some(error);
    }

    #[must_use]
    pub fn filtered(&self) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| self.filter.matches(entry))
            .collect()
    }

    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }
}
