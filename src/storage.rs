// File: ./src/storage.rs
// Manages the JSON snapshot files for tasks, bills and calendar events.
//
// ⚠️ VERSION BUMP REQUIRED:
// Changes to TaskDefinition, BillDefinition or CalendarEvent serialization
// require incrementing STORAGE_VERSION below.
use crate::context::AppContext;
use crate::model::{BillDefinition, CalendarEvent, TaskDefinition};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

// Version history:
// - v1: tasks, bills and events in `{ version, items }` envelopes
const STORAGE_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    items: &'a [T],
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    version: u32,
    items: Vec<T>,
}

/// Tracks whether the last load of each file succeeded, so a save never
/// overwrites data that could not be read.
static LOAD_STATE_MAP: OnceLock<Mutex<HashMap<PathBuf, LoadState>>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Uninitialized,
    Success,
    Failed,
}

impl LoadState {
    fn get(path: &Path) -> LoadState {
        let map = LOAD_STATE_MAP.get_or_init(|| Mutex::new(HashMap::new()));
        match map.lock() {
            Ok(map) => *map.get(path).unwrap_or(&LoadState::Uninitialized),
            Err(poisoned) => *poisoned
                .into_inner()
                .get(path)
                .unwrap_or(&LoadState::Uninitialized),
        }
    }

    fn set(path: &Path, state: LoadState) {
        let map = LOAD_STATE_MAP.get_or_init(|| Mutex::new(HashMap::new()));
        let mut guard = match map.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(path.to_path_buf(), state);
    }
}

pub struct LocalStorage;

impl LocalStorage {
    pub fn load_tasks(ctx: &dyn AppContext) -> Result<Vec<TaskDefinition>> {
        Self::load_collection(&ctx.get_tasks_path()?)
    }

    pub fn save_tasks(ctx: &dyn AppContext, tasks: &[TaskDefinition]) -> Result<()> {
        Self::save_collection(&ctx.get_tasks_path()?, tasks)
    }

    pub fn load_bills(ctx: &dyn AppContext) -> Result<Vec<BillDefinition>> {
        Self::load_collection(&ctx.get_bills_path()?)
    }

    pub fn save_bills(ctx: &dyn AppContext, bills: &[BillDefinition]) -> Result<()> {
        Self::save_collection(&ctx.get_bills_path()?, bills)
    }

    pub fn load_events(ctx: &dyn AppContext) -> Result<Vec<CalendarEvent>> {
        Self::load_collection(&ctx.get_events_path()?)
    }

    pub fn save_events(ctx: &dyn AppContext, events: &[CalendarEvent]) -> Result<()> {
        Self::save_collection(&ctx.get_events_path()?, events)
    }

    /// Reads task definitions from a plain JSON array, as accepted by `import`.
    pub fn read_task_file(path: &Path) -> Result<Vec<TaskDefinition>> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a JSON array of tasks", path.display()))
    }

    /// Helper to get a sidecar lock file path
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Runs `f` while holding an exclusive lock on the sidecar lock file.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            LoadState::set(path, LoadState::Success);
            return Ok(vec![]);
        }

        let result = Self::with_lock(path, || {
            let json = fs::read_to_string(path)?;
            let data: Envelope<T> = serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            if data.version > STORAGE_VERSION {
                anyhow::bail!(
                    "{} has storage version {}, newer than supported version {}",
                    path.display(),
                    data.version,
                    STORAGE_VERSION
                );
            }
            Ok(data.items)
        });

        match &result {
            Ok(items) => {
                log::debug!("Loaded {} records from {}", items.len(), path.display());
                LoadState::set(path, LoadState::Success);
            }
            Err(e) => {
                log::error!("Failed to load {}: {:#}", path.display(), e);
                LoadState::set(path, LoadState::Failed);
            }
        }
        result
    }

    fn save_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
        if LoadState::get(path) == LoadState::Failed {
            anyhow::bail!(
                "Cannot save {}: previous load failed. This prevents overwriting data that couldn't be read.",
                path.display()
            );
        }
        Self::with_lock(path, || {
            let data = EnvelopeRef {
                version: STORAGE_VERSION,
                items,
            };
            let json = serde_json::to_string_pretty(&data)?;
            Self::atomic_write(path, json)?;
            Ok(())
        })
    }
}
