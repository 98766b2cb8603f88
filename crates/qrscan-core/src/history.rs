use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, SubsecRound, TimeDelta};

use crate::error::HistoryError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const SEPARATOR: &str = " -> ";

/// Writer lock for one log path, guarding the last stamp written to it
type WriterLock = Arc<Mutex<Option<DateTime<Local>>>>;

/// One writer lock per log path, shared by every store in the process
static WRITE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, WriterLock>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn write_lock_for(path: &Path) -> WriterLock {
    let mut locks = WRITE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(path.to_path_buf()).or_default().clone()
}

/// A persisted scan: `<timestamp> -> <payload>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub payload: String,
}

impl HistoryRecord {
    fn stamped(at: DateTime<Local>, payload: &str) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            payload: payload.to_string(),
        }
    }

    /// The on-disk line, including the trailing newline
    pub fn to_line(&self) -> String {
        format!("{}{SEPARATOR}{}\n", self.timestamp, Escaped(&self.payload))
    }

    /// Lines without a separator are kept whole as the payload
    pub fn parse(line: &str) -> Self {
        match line.split_once(SEPARATOR) {
            Some((timestamp, payload)) => Self {
                timestamp: timestamp.to_string(),
                payload: unescape(payload),
            },
            None => Self {
                timestamp: String::new(),
                payload: unescape(line),
            },
        }
    }
}

/// Append-only scan log backed by a text file
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    lock: WriterLock,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let key = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
        Self {
            lock: write_lock_for(&key),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `payload` stamped with the current local time.
    ///
    /// Creates the parent directory on first write. Each record goes out in a
    /// single append-mode write while holding the per-path lock, so concurrent
    /// appends never interleave within a line. Stamps written through this
    /// process are strictly increasing, one microsecond apart at least.
    pub fn append(&self, payload: &str) -> Result<HistoryRecord, HistoryError> {
        let mut last = self.guard();
        let mut at = Local::now().trunc_subsecs(6);
        if let Some(prev) = *last
            && at <= prev
        {
            at = prev + TimeDelta::microseconds(1);
        }
        let record = HistoryRecord::stamped(at, payload);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(record.to_line().as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| self.io_error(e))?;
        *last = Some(at);

        tracing::debug!(
            path = %self.path.display(),
            payload_len = payload.len(),
            "history record appended"
        );
        Ok(record)
    }

    /// Up to `limit` records, newest first. A missing log reads as empty.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self
            .recent_lines(limit)?
            .iter()
            .map(|line| HistoryRecord::parse(line))
            .collect())
    }

    /// Raw log lines, newest first, blank lines skipped.
    /// Bytes that are not UTF-8 are replaced rather than failing the read.
    pub fn recent_lines(&self, limit: usize) -> Result<Vec<String>, HistoryError> {
        let data = {
            let _guard = self.guard();
            match fs::read(&self.path) {
                Ok(data) => data,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(self.io_error(e)),
            }
        };

        Ok(data
            .split(|&b| b == b'\n')
            .rev()
            .map(String::from_utf8_lossy)
            .filter(|line| !line.trim().is_empty())
            .take(limit)
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect())
    }

    fn guard(&self) -> MutexGuard<'_, Option<DateTime<Local>>> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn io_error(&self, source: io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Writes a payload with `\`, `\n` and `\r` escaped so it stays on one line
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            // Unknown escapes come from hand-edited logs, keep them verbatim
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
