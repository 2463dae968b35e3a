//! Append-only request log
//!
//! One structured JSON record per filtered request, one record per line.
//! Writes are best-effort: a failed append is reported through tracing and
//! never blocks the response. No rotation, no size bound.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Everything captured about one request before its handler runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub method: String,
    pub path: String,
    pub client_ip: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

/// Thread-safe writer over the log file.
pub struct RequestLog {
    file: Mutex<File>,
}

impl RequestLog {
    /// Open the log destination for appending, creating parent directories
    /// and the file itself as needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one record as a single NDJSON line. Failures are swallowed
    /// after a warning; the caller's response must not depend on the log.
    pub fn append(&self, entry: &RequestLogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(err) => {
                warn!("Failed to serialize request log entry: {}", err);
                return;
            }
        };

        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(err) = writeln!(file, "{}", line) {
            warn!("Failed to append request log entry: {}", err);
        }
    }
}
