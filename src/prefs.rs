//! Small persisted preferences, separate from the story database.
//!
//! Currently a single flag: whether the database has completed its first
//! source sync. The splash surface watches it to decide when bootstrap is
//! done.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

use crate::app::Result;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct PrefValues {
    #[serde(default)]
    db_initialized: bool,
}

pub struct Preferences {
    values: Mutex<PrefValues>,
    db_initialized_tx: watch::Sender<bool>,
    path: Option<PathBuf>,
}

impl Preferences {
    /// Load from a TOML file, starting from defaults when it is missing.
    pub fn load(path: PathBuf) -> Result<Self> {
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str(&raw).unwrap_or_default()
        } else {
            PrefValues::default()
        };
        Ok(Self::with_values(values, Some(path)))
    }

    /// Non-persisted preferences for tests and embedders without a data dir.
    pub fn in_memory() -> Self {
        Self::with_values(PrefValues::default(), None)
    }

    fn with_values(values: PrefValues, path: Option<PathBuf>) -> Self {
        let (db_initialized_tx, _) = watch::channel(values.db_initialized);
        Self {
            values: Mutex::new(values),
            db_initialized_tx,
            path,
        }
    }

    pub fn db_initialized(&self) -> bool {
        *self.db_initialized_tx.borrow()
    }

    pub fn set_db_initialized(&self, value: bool) {
        {
            let mut values = match self.values.lock() {
                Ok(values) => values,
                Err(poisoned) => poisoned.into_inner(),
            };
            values.db_initialized = value;
            self.persist(*values);
        }
        self.db_initialized_tx.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Watch the flag; the receiver sees the current value immediately via
    /// `borrow` and change notifications afterwards.
    pub fn watch_db_initialized(&self) -> watch::Receiver<bool> {
        self.db_initialized_tx.subscribe()
    }

    fn persist(&self, values: PrefValues) {
        let Some(path) = &self.path else {
            return;
        };
        let write = || -> Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let raw = toml::to_string(&values)
                .map_err(|e| crate::app::NewsflowError::Config(e.to_string()))?;
            fs::write(path, raw)?;
            Ok(())
        };
        if let Err(e) = write() {
            warn!("preference write failed: {e}");
        }
    }
}
