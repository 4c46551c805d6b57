//! Durable, file-backed event store.
//!
//! The log is a JSON-lines file: one [`StoredEvent`] per line, appended and
//! flushed to disk (`sync_data`) before the sequence number is handed out.
//! Every committed event is also kept in memory so reads never touch the disk.
//!
//! ## Crash Recovery
//!
//! On open the whole file is scanned:
//! - a final line without a terminating newline is a torn write from a crash
//!   (it was never acknowledged) and is truncated away
//! - any other line that does not parse, or whose sequence number does not
//!   increase, makes the log [`EventStoreError::Corrupt`]

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, error, warn};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent, matches};

#[derive(Debug)]
struct FileLog {
    file: File,
    /// Length of the committed prefix of the file, in bytes.
    len: u64,
    events: Vec<StoredEvent>,
}

impl FileLog {
    fn last_sequence(&self) -> u64 {
        self.events.last().map(|e| e.sequence_number).unwrap_or(0)
    }

    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.file.write_all(line)?;
        self.file.sync_data()
    }
}

/// Append-only event store persisted to a single JSON-lines file.
#[derive(Debug)]
pub struct FileEventStore {
    path: PathBuf,
    log: RwLock<FileLog>,
}

impl FileEventStore {
    /// Open (or create) the log at `path` and load its committed events.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EventStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;

        let (events, committed_len) = parse_log(&raw)?;
        if committed_len < raw.len() as u64 {
            warn!(
                path = %path.display(),
                dropped_bytes = raw.len() as u64 - committed_len,
                "truncating torn write at end of event log"
            );
            file.set_len(committed_len)?;
            file.sync_data()?;
        }

        debug!(path = %path.display(), events = events.len(), "opened event log");

        Ok(Self {
            path,
            log: RwLock::new(FileLog {
                file,
                len: committed_len,
                events,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStore for FileEventStore {
    fn append(&self, event: UncommittedEvent) -> Result<StoredEvent, EventStoreError> {
        let mut log = self.log.write().map_err(|_| EventStoreError::LockPoisoned)?;

        let stored = StoredEvent::commit(event, log.last_sequence() + 1);
        let mut line = serde_json::to_vec(&stored)
            .map_err(|e| EventStoreError::Serialization(e.to_string()))?;
        line.push(b'\n');

        if let Err(err) = log.write_line(&line) {
            // Drop any partial line so the next append starts on a clean boundary.
            let committed = log.len;
            if let Err(truncate_err) = log.file.set_len(committed) {
                error!(
                    path = %self.path.display(),
                    error = %truncate_err,
                    "failed to roll back partial append"
                );
            }
            return Err(err.into());
        }

        log.len += line.len() as u64;
        log.events.push(stored.clone());
        Ok(stored)
    }

    fn load_after(&self, after: u64, event_types: &[&str]) -> Result<Vec<StoredEvent>, EventStoreError> {
        let log = self.log.read().map_err(|_| EventStoreError::LockPoisoned)?;
        Ok(log
            .events
            .iter()
            .filter(|e| matches(e, after, event_types))
            .cloned()
            .collect())
    }

    fn last_sequence(&self) -> Result<u64, EventStoreError> {
        let log = self.log.read().map_err(|_| EventStoreError::LockPoisoned)?;
        Ok(log.last_sequence())
    }
}

/// Parse the raw file, returning the committed events and the byte length of
/// the committed prefix.
fn parse_log(raw: &[u8]) -> Result<(Vec<StoredEvent>, u64), EventStoreError> {
    let mut events: Vec<StoredEvent> = Vec::new();
    let mut offset = 0usize;
    let mut last = 0u64;

    for (idx, chunk) in raw.split_inclusive(|b| *b == b'\n').enumerate() {
        let line = idx + 1;
        let Some(body) = chunk.strip_suffix(b"\n") else {
            // Unterminated tail: never acknowledged, drop it.
            break;
        };

        if !body.iter().all(u8::is_ascii_whitespace) {
            let stored: StoredEvent = serde_json::from_slice(body).map_err(|e| {
                EventStoreError::Corrupt {
                    line,
                    message: e.to_string(),
                }
            })?;

            if stored.sequence_number <= last {
                return Err(EventStoreError::Corrupt {
                    line,
                    message: format!(
                        "non-monotonic sequence_number (last={last}, found={})",
                        stored.sequence_number
                    ),
                });
            }
            last = stored.sequence_number;
            events.push(stored);
        }

        offset += chunk.len();
    }

    Ok((events, offset as u64))
}
