use chrono::{DateTime, Utc};

/// Last successful sync time for a named resource. At most one row per
/// resource; a missing row means the resource has never been synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRecord {
    pub resource: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncRecord {
    pub fn new(resource: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            resource: resource.into(),
            timestamp,
        }
    }
}
