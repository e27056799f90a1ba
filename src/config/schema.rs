/// Configuration schema and defaults for vaxtrack.
///
/// Defines the TOML-serializable configuration structure with the
/// `[api]`, `[session]`, `[logging]` and `[display]` sections. Every field
/// has a built-in default; users only set what they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level vaxtrack configuration.
///
/// Maps directly to `~/.vaxtrack/config.toml` and `.vaxtrack.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaxConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Body shape used for `POST /vaccinations/upload`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadEnvelope {
    /// The parsed file content is sent as the request body.
    #[default]
    Raw,
    /// The content is wrapped as `{"vaccination_json": ...}` (legacy).
    Wrapped,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every resource path is appended to.
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Extra attempts for idempotent reads after a transient failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_backoff_ms: u64,
    pub upload_envelope: UploadEnvelope,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.prs-api.xyz/api".to_string(),
            timeout_ms: 10_000,
            max_retries: 2,
            retry_backoff_ms: 250,
            upload_envelope: UploadEnvelope::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file override. Empty means `~/.vaxtrack/session.json`.
    pub file: String,
}

impl SessionConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if self.file.is_empty() {
            vaxtrack_home().map(|home| home.join("session.json"))
        } else {
            Some(PathBuf::from(&self.file))
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether API calls are appended to the activity log.
    pub enabled: bool,
    /// Activity log override. Empty means `~/.vaxtrack/activity.jsonl`.
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: String::new(),
        }
    }
}

impl LoggingConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if self.file.is_empty() {
            vaxtrack_home().map(|home| home.join("activity.jsonl"))
        } else {
            Some(PathBuf::from(&self.file))
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Default output format: `table` or `json`.
    pub format: String,
    /// Colored terminal output.
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: "table".to_string(),
            color: true,
        }
    }
}

/// `~/.vaxtrack`, the directory holding config, session and logs.
pub fn vaxtrack_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".vaxtrack"))
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl VaxConfig {
    /// Default config file written by `vaxtrack config init`.
    pub fn default_toml() -> &'static str {
        r#"# vaxtrack configuration
#
# Precedence: built-in defaults < ~/.vaxtrack/config.toml < ./.vaxtrack.toml
# < VAXTRACK_* environment variables.

[api]
# Base URL of the vaccination/inventory API.
base_url = "https://api.prs-api.xyz/api"
# Per-request timeout in milliseconds.
timeout_ms = 10000
# Retries for GET requests after a network error, 429 or 5xx.
max_retries = 2
# First retry delay in milliseconds (doubles per attempt, capped at 5s).
retry_backoff_ms = 250
# Upload body shape: "raw" or "wrapped" ({"vaccination_json": ...}).
upload_envelope = "raw"

[session]
# Session file. Empty = ~/.vaxtrack/session.json
file = ""

[logging]
# Append one JSON line per API call to the activity log.
enabled = true
# Activity log file. Empty = ~/.vaxtrack/activity.jsonl
file = ""

[display]
# "table" or "json"
format = "table"
color = true
"#
    }
}
