//! Ledger - the durable entry/exit history.
//!
//! Entries are kept in memory, sorted by entry time, and the whole history is
//! written back to the store after every mutation. Open entries are indexed
//! per plate so closing one never scans the history. Storage failures never
//! reach the allocation path: the ledger logs them and carries on in memory.
//!
//! # File format
//!
//! One record per line, no header:
//!
//! ```text
//! plate,entry,exit|null,vip,slot_id
//! KA-01-1234,2024-03-01T09:15:02.118,2024-03-01T11:40:57.003,false,17
//! VIP-7,2024-03-01T10:02:44,null,true,903
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error, warn};

use crate::error::StorageError;
use crate::slot::SlotId;

/// Literal written in place of a missing exit timestamp
pub const OPEN_SENTINEL: &str = "null";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// One stay in the lot
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LedgerEntry {
    pub plate: String,
    pub entered_at: NaiveDateTime,
    /// `None` while the vehicle is still parked
    pub exited_at: Option<NaiveDateTime>,
    pub vip: bool,
    pub slot_id: SlotId,
}

impl LedgerEntry {
    pub fn open(plate: impl Into<String>, vip: bool, slot_id: SlotId, at: NaiveDateTime) -> Self {
        Self {
            plate: plate.into(),
            entered_at: at,
            exited_at: None,
            vip,
            slot_id,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }

    /// Stay length, for closed entries
    pub fn stay(&self) -> Option<chrono::Duration> {
        self.exited_at.map(|exit| exit - self.entered_at)
    }

    fn to_record(&self) -> [String; 5] {
        [
            self.plate.clone(),
            format_timestamp(self.entered_at),
            self.exited_at
                .map_or_else(|| OPEN_SENTINEL.to_string(), format_timestamp),
            self.vip.to_string(),
            self.slot_id.to_string(),
        ]
    }

    fn from_record(record: &csv::StringRecord) -> Option<Self> {
        if record.len() != 5 {
            return None;
        }
        let exited_at = match &record[2] {
            OPEN_SENTINEL => None,
            raw => Some(parse_timestamp(raw)?),
        };
        Some(Self {
            plate: record[0].to_string(),
            entered_at: parse_timestamp(&record[1])?,
            exited_at,
            vip: record[3].trim().eq_ignore_ascii_case("true"),
            slot_id: record[4].trim().parse().ok()?,
        })
    }
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse an ISO-8601 local date-time, with or without seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, MINUTE_FORMAT))
        .ok()
}

/// Backing storage for the ledger.
pub trait LedgerStore: Send + Sync {
    /// Read every persisted entry. Missing storage is an empty ledger.
    fn load(&mut self) -> Result<Vec<LedgerEntry>, StorageError>;

    /// Replace the persisted ledger with `entries`
    fn save(&mut self, entries: &[LedgerEntry]) -> Result<(), StorageError>;
}

/// Comma-separated text file, rewritten in full on every save
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LedgerStore for FileStore {
    fn load(&mut self) -> Result<Vec<LedgerEntry>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut entries = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let parsed = match record {
                Ok(record) => LedgerEntry::from_record(&record),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!(line = line + 1, error = %e, "unreadable ledger record skipped");
                    continue;
                }
            };
            match parsed {
                Some(entry) => entries.push(entry),
                None => warn!(
                    line = line + 1,
                    path = %self.path.display(),
                    "malformed ledger record skipped"
                ),
            }
        }
        Ok(entries)
    }

    fn save(&mut self, entries: &[LedgerEntry]) -> Result<(), StorageError> {
        let file = File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(BufWriter::new(file));

        for entry in entries {
            writer.write_record(entry.to_record())?;
        }
        writer.flush()?;
        let mut inner = writer.into_inner().map_err(|e| e.into_error())?;
        inner.flush()?;
        Ok(())
    }
}

/// In-process store. Clones share the same backing vector, so a test can
/// keep a handle and "restart" a ledger against it.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Vec<LedgerEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<LedgerEntry>) -> Self {
        Self {
            saved: Arc::new(Mutex::new(entries)),
        }
    }

    /// Entries as of the last save
    pub fn saved(&self) -> Vec<LedgerEntry> {
        self.saved.lock().clone()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<LedgerEntry>, StorageError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&mut self, entries: &[LedgerEntry]) -> Result<(), StorageError> {
        let mut saved = self.saved.lock();
        saved.clear();
        saved.extend_from_slice(entries);
        Ok(())
    }
}

/// Store that keeps nothing. The ledger's own entries are the only copy.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStore;

impl LedgerStore for NullStore {
    fn load(&mut self) -> Result<Vec<LedgerEntry>, StorageError> {
        Ok(Vec::new())
    }

    fn save(&mut self, _entries: &[LedgerEntry]) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Open entries of one plate, keyed by (entry time, position in `entries`)
type OpenSet = BTreeSet<(NaiveDateTime, usize)>;

/// The entry/exit history and its backing store.
pub struct Ledger {
    /// Sorted by entry time; equal times keep insertion order
    entries: Vec<LedgerEntry>,
    /// Plate -> positions of its open entries, earliest first
    open: FxHashMap<String, OpenSet>,
    store: Box<dyn LedgerStore>,
    /// False after a failed save, until a later save succeeds
    durable: bool,
}

impl Ledger {
    /// Load the history from `store`.
    ///
    /// Unreadable storage yields an empty, non-durable ledger.
    pub fn open(store: impl LedgerStore + 'static) -> Self {
        let mut store: Box<dyn LedgerStore> = Box::new(store);
        let (mut entries, durable) = match store.load() {
            Ok(entries) => (entries, true),
            Err(e) => {
                error!(error = %e, "ledger storage unavailable, starting empty");
                (Vec::new(), false)
            }
        };
        entries.sort_by_key(|e| e.entered_at);
        debug!(entries = entries.len(), "ledger loaded");

        let mut ledger = Self {
            entries,
            open: FxHashMap::default(),
            store,
            durable,
        };
        ledger.reindex();
        ledger
    }

    /// A ledger that never touches the filesystem and keeps no second copy
    pub fn in_memory() -> Self {
        Self::open(NullStore)
    }

    /// Append an open entry and persist.
    pub fn record_entry(
        &mut self,
        plate: &str,
        vip: bool,
        slot_id: SlotId,
        at: NaiveDateTime,
    ) -> LedgerEntry {
        let entry = LedgerEntry::open(plate, vip, slot_id, at);
        let index = self.entries.partition_point(|e| e.entered_at <= at);
        self.entries.insert(index, entry.clone());

        if index + 1 == self.entries.len() {
            self.open
                .entry(plate.to_string())
                .or_default()
                .insert((at, index));
        } else {
            // Clock went backwards; later positions shifted
            warn!(plate, entered_at = %at, "entry recorded before the latest one");
            self.reindex();
        }
        self.persist();
        entry
    }

    /// Close the earliest open entry for `plate` and persist.
    ///
    /// Returns `None` without touching storage if the plate has no open entry.
    pub fn record_exit(&mut self, plate: &str, at: NaiveDateTime) -> Option<LedgerEntry> {
        let key = *self.open.get(plate)?.first()?;
        Some(self.close(plate, key, at))
    }

    /// Close the open entry for `plate` that started at `entered_at`,
    /// falling back to the earliest open entry for the plate.
    pub fn record_exit_for(
        &mut self,
        plate: &str,
        entered_at: NaiveDateTime,
        at: NaiveDateTime,
    ) -> Option<LedgerEntry> {
        let set = self.open.get(plate)?;
        let key = set
            .range((entered_at, 0)..=(entered_at, usize::MAX))
            .next()
            .or_else(|| set.first())
            .copied()?;
        Some(self.close(plate, key, at))
    }

    fn close(
        &mut self,
        plate: &str,
        key: (NaiveDateTime, usize),
        at: NaiveDateTime,
    ) -> LedgerEntry {
        if let Some(set) = self.open.get_mut(plate) {
            set.remove(&key);
            if set.is_empty() {
                self.open.remove(plate);
            }
        }

        let entry = &mut self.entries[key.1];
        entry.exited_at = Some(at);
        let closed = entry.clone();
        self.persist();
        closed
    }

    /// Rebuild the open-entry index from `entries`.
    fn reindex(&mut self) {
        self.open.clear();
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.is_open() {
                self.open
                    .entry(entry.plate.clone())
                    .or_default()
                    .insert((entry.entered_at, index));
            }
        }
    }

    /// Rewrite the store with the chronological history.
    fn persist(&mut self) {
        match self.store.save(&self.entries) {
            Ok(()) => {
                if !self.durable {
                    debug!("ledger storage recovered");
                }
                self.durable = true;
            }
            Err(e) => {
                error!(
                    error = %e,
                    entries = self.entries.len(),
                    "ledger save failed, continuing in memory"
                );
                self.durable = false;
            }
        }
    }

    /// All entries, chronological
    #[inline]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn open_entries(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries.iter().filter(|e| e.is_open())
    }

    /// Number of entries still waiting for an exit
    pub fn open_count(&self) -> usize {
        self.open.values().map(BTreeSet::len).sum()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the last load or save reached the store
    #[inline]
    pub fn is_durable(&self) -> bool {
        self.durable
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("entries", &self.entries.len())
            .field("durable", &self.durable)
            .finish()
    }
}
