//! StateStore implementations: a JSON file and an in-memory slot

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, trace};

use super::{PersistedState, StateStore};
use crate::error::{DetectorError, Result};

// ============================================
// JSON FILE STORE
// ============================================

/// Single JSON file, last write wins
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    dir: PathBuf,
    file: String,
}

impl JsonStateStore {
    pub fn new<P: AsRef<Path>>(dir: P, file: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            file: file.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}

impl StateStore for JsonStateStore {
    fn read(&self) -> Result<Option<PersistedState>> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state file at {}, starting fresh", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let state = serde_json::from_str(&content).map_err(|e| {
            DetectorError::State(format!("corrupt state file {}: {}", path.display(), e))
        })?;

        Ok(Some(state))
    }

    fn write(&self, state: &PersistedState) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut stamped = state.clone();
        stamped.touch();

        // Sibling file, then rename over the target
        let path = self.path();
        let tmp = self.dir.join(format!("{}.tmp", self.file));
        fs::write(&tmp, serde_json::to_vec_pretty(&stamped)?)?;
        fs::rename(&tmp, &path)?;

        trace!(
            "State written to {} ({} tokens, {} spammers)",
            path.display(),
            stamped.scam_tokens.len(),
            stamped.spammer_addresses.len()
        );
        Ok(())
    }
}

// ============================================
// IN-MEMORY STORE
// ============================================

/// In-process store for embedders and tests
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    slot: Mutex<Option<PersistedState>>,
    fail_writes: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every following write fail (simulates a full disk)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<PersistedState>>> {
        self.slot
            .lock()
            .map_err(|_| DetectorError::State("memory store lock poisoned".to_string()))
    }
}

impl StateStore for MemoryStateStore {
    fn read(&self) -> Result<Option<PersistedState>> {
        Ok(self.lock()?.clone())
    }

    fn write(&self, state: &PersistedState) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DetectorError::State("write rejected".to_string()));
        }
        let mut stamped = state.clone();
        stamped.touch();
        *self.lock()? = Some(stamped);
        Ok(())
    }
}
