use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ---------------------------------------------------------------------------
// Activity entry (JSONL)
// ---------------------------------------------------------------------------

/// One API call in the activity log (`~/.vaxtrack/activity.jsonl`).
///
/// Never carries request or response bodies, tokens or passwords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    /// Client operation name, e.g. `"fetch_public_summary"`.
    pub operation: String,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    pub success: bool,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    pub latency_ms: u64,
    /// Error kind (`network`, `http`, `decode`, ...) for failed calls.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

fn default_attempts() -> u32 {
    1
}

/// Where activity goes. A disabled log drops every entry.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record the outcome of one call. Best-effort; write failures are
    /// swallowed so logging can never fail a request.
    pub fn record<T>(
        &self,
        operation: &str,
        method: &str,
        path: &str,
        outcome: &Result<(u16, T), Error>,
        attempts: u32,
        elapsed: Duration,
    ) {
        if self.path.is_none() {
            return;
        }

        let (success, status, error) = match outcome {
            Ok((status, _)) => (true, Some(*status), None),
            Err(e) => (false, e.status(), Some(e.kind().to_string())),
        };

        let entry = ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            operation: operation.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            status,
            success,
            attempts,
            latency_ms: elapsed.as_millis() as u64,
            error,
        };

        let _ = self.append(&entry);
    }

    /// Read all entries, skipping malformed lines.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
            .collect()
    }

    /// The last `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut entries = self.read_all();
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        entries
    }

    fn append(&self, entry: &ActivityEntry) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}
