use serde::{Deserialize, Serialize};

/// A news source as read back from the store: base fields joined with the
/// user's selection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub url: String,
    pub selected: bool,
}

/// Sync-owned half of a source. Replaced wholesale on every source sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBase {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// User-owned half of a source. Inserted default-unselected on first sight
/// and otherwise only touched by an explicit user toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    pub id: String,
    pub selected: bool,
}

impl SourceSelection {
    pub fn unselected(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selected: false,
        }
    }
}
