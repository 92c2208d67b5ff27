use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::store::Store;

/// Decides whether a resource is due for a refresh, based on its last-sync
/// record. Read-only; recording a successful sync is the engine's job.
pub struct SyncThrottle {
    store: Arc<dyn Store>,
}

impl SyncThrottle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// A missing record means the resource has never synced and is due.
    pub fn is_due(&self, resource: &str, now: DateTime<Utc>, interval: Duration) -> Result<bool> {
        match self.store.sync_record(resource)? {
            None => Ok(true),
            Some(record) => {
                let elapsed = now - record.timestamp;
                Ok(elapsed >= chrono::Duration::seconds(interval.as_secs() as i64))
            }
        }
    }
}
