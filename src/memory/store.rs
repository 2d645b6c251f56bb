//! Episodic memory for a step loop
//!
//! Three kinds of state live here:
//! - a bounded FIFO of step summaries (oldest evicted first)
//! - a scratch state string, overwritten every step
//! - a key-value store that survives until keys are deleted
//!
//! Only the key-value store is unbounded in time. Summaries and state are
//! lossy by construction so prompts stay small. Values are never placed in a
//! prompt unless the model explicitly retrieves them.

use std::collections::{BTreeMap, VecDeque};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::AgentResult;

/// Default number of step summaries kept in memory
pub const DEFAULT_SUMMARY_CAPACITY: usize = 25;

/// Read-only view of memory used when rendering prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Most recent summaries, oldest first
    pub summaries: Vec<String>,
    /// How many summaries have been evicted so far
    pub evicted: usize,
    /// Current scratch state
    pub state: String,
    /// Keys present in the key-value store, sorted
    pub known_keys: Vec<String>,
}

impl MemorySnapshot {
    /// Whether older summaries were dropped
    pub fn is_truncated(&self) -> bool {
        self.evicted > 0
    }
}

/// On-disk form of the key-value store
#[derive(Debug, Serialize, Deserialize)]
struct PersistedMemory {
    saved_at: DateTime<Utc>,
    values: BTreeMap<String, Value>,
}

/// Memory store owned by a single step loop
#[derive(Debug)]
pub struct MemoryStore {
    summaries: VecDeque<String>,
    capacity: usize,
    evicted: usize,
    state: String,
    values: BTreeMap<String, Value>,
    /// Entries an in-memory store starts every run with
    baseline: BTreeMap<String, Value>,
    storage_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create an in-memory store with the default summary capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUMMARY_CAPACITY)
    }

    /// Create an in-memory store keeping at most `capacity` summaries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            summaries: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
            state: String::new(),
            values: BTreeMap::new(),
            baseline: BTreeMap::new(),
            storage_path: None,
        }
    }

    /// Open a store whose key-value entries are backed by a JSON file.
    ///
    /// A missing file starts empty. A file that cannot be parsed is logged
    /// and ignored; it is overwritten on the next store or delete.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> AgentResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self::with_capacity(capacity);

        if let Some(values) = load_persisted(&path)? {
            store.values = values;
        }

        store.storage_path = Some(path);
        Ok(store)
    }

    /// Keep the current entries as the starting point of every run.
    ///
    /// Only meaningful for in-memory stores; a file-backed store always
    /// starts a run with whatever its file holds.
    pub fn mark_baseline(&mut self) {
        self.baseline = self.values.clone();
    }

    /// Reset per-run state before a new run.
    ///
    /// Summaries, the eviction count and the scratch state are cleared. The
    /// key-value store is reloaded from its file when file-backed, otherwise
    /// it goes back to the baseline entries.
    pub fn begin_run(&mut self) -> AgentResult<()> {
        self.summaries.clear();
        self.evicted = 0;
        self.state.clear();

        self.values = match &self.storage_path {
            Some(path) => load_persisted(path)?.unwrap_or_default(),
            None => self.baseline.clone(),
        };
        Ok(())
    }

    // =========================================================================
    // Directive operations
    // =========================================================================

    /// Insert or overwrite a value
    pub fn store(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        tracing::debug!("[MemoryStore] store {}", key);
        self.values.insert(key, value);
        self.persist();
    }

    /// Values for the requested keys that exist; absent keys are omitted
    pub fn retrieve<S: AsRef<str>>(&self, keys: &[S]) -> Map<String, Value> {
        keys.iter()
            .filter_map(|key| {
                let key = key.as_ref();
                self.values.get(key).map(|v| (key.to_string(), v.clone()))
            })
            .collect()
    }

    /// Remove keys; absent keys are ignored
    pub fn delete<S: AsRef<str>>(&mut self, keys: &[S]) {
        let mut removed = 0;
        for key in keys {
            if self.values.remove(key.as_ref()).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!("[MemoryStore] deleted {} keys", removed);
            self.persist();
        }
    }

    // =========================================================================
    // Step bookkeeping
    // =========================================================================

    /// Append a step summary, evicting the oldest beyond capacity
    pub fn record_summary(&mut self, text: impl Into<String>) {
        self.summaries.push_back(text.into());
        while self.summaries.len() > self.capacity {
            self.summaries.pop_front();
            self.evicted += 1;
        }
    }

    /// Replace the scratch state
    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = state.into();
    }

    /// Current scratch state
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Summaries currently held, oldest first
    pub fn summaries(&self) -> impl Iterator<Item = &str> {
        self.summaries.iter().map(|s| s.as_str())
    }

    /// Maximum number of summaries kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the key-value store is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check whether a key is stored
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Read-only view for prompt rendering
    pub fn snapshot_for_prompt(&self) -> MemorySnapshot {
        MemorySnapshot {
            summaries: self.summaries.iter().cloned().collect(),
            evicted: self.evicted,
            state: self.state.clone(),
            known_keys: self.values.keys().cloned().collect(),
        }
    }

    /// Full dump of memory contents, used for diagnostics
    pub fn dump(&self) -> Value {
        serde_json::json!({
            "summaries": self.summaries,
            "evicted": self.evicted,
            "state": self.state,
            "values": self.values,
        })
    }

    fn persist(&self) {
        let Some(path) = &self.storage_path else {
            return;
        };

        let persisted = PersistedMemory {
            saved_at: Utc::now(),
            values: self.values.clone(),
        };

        if let Err(e) = write_persisted(path, &persisted) {
            tracing::warn!("[MemoryStore] Failed to persist memory to {:?}: {}", path, e);
        }
    }
}

/// Read the key-value entries of a memory file.
///
/// Returns `None` when the file is missing or cannot be parsed.
fn load_persisted(path: &Path) -> AgentResult<Option<BTreeMap<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    match serde_json::from_reader::<_, PersistedMemory>(BufReader::new(file)) {
        Ok(persisted) => {
            tracing::info!(
                "[MemoryStore] Loaded {} keys from {:?} (saved {})",
                persisted.values.len(),
                path,
                persisted.saved_at
            );
            Ok(Some(persisted.values))
        }
        Err(e) => {
            tracing::warn!("[MemoryStore] Ignoring unreadable memory file {:?}: {}", path, e);
            Ok(None)
        }
    }
}

/// Write to a sibling temp file, then rename over the target
fn write_persisted(path: &Path, persisted: &PersistedMemory) -> AgentResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path);
    let file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, persisted)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
