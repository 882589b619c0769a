use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    urls: Vec<String>,
}

/// Durable set of already-published candidate identifiers.
///
/// Loaded once at process start, appended to (never removed from) on every
/// successful publish, and flushed to disk on each append. The lock makes
/// writes mutually exclusive should runs ever execute concurrently;
/// membership reads only take the read half.
pub struct ProcessedSet {
    path: PathBuf,
    urls: RwLock<HashSet<String>>,
}

impl ProcessedSet {
    /// Load prior state from `path`. A missing file is a normal first run;
    /// an unreadable one is logged and treated as empty.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let urls = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HistoryFile>(&raw) {
                Ok(file) => file.urls.into_iter().collect(),
                Err(e) => {
                    warn!("Failed to parse history file {}: {}", path.display(), e);
                    HashSet::new()
                }
            },
            Err(_) => HashSet::new(),
        };

        info!("Loaded {} processed identifiers from history", urls.len());
        Self {
            path,
            urls: RwLock::new(urls),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.urls.read().expect("history lock poisoned").contains(id)
    }

    pub fn len(&self) -> usize {
        self.urls.read().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an identifier and persist immediately. Re-recording a known
    /// identifier is a no-op, so the set size is idempotent under repeats.
    /// A failed flush is logged, not raised: the publish already happened
    /// and the run outcome must not change retroactively.
    pub fn record(&self, id: &str) {
        if id.is_empty() {
            return;
        }

        {
            let mut urls = self.urls.write().expect("history lock poisoned");
            if !urls.insert(id.to_string()) {
                return;
            }
        }

        if let Err(e) = self.persist() {
            warn!("Failed to persist history to {}: {}", self.path.display(), e);
        } else {
            info!("Identifier added to history: {}", id);
        }
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let snapshot: Vec<String> = {
            let urls = self.urls.read().expect("history lock poisoned");
            urls.iter().cloned().collect()
        };

        let file = HistoryFile { urls: snapshot };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}
