/// Configuration system for vaxtrack.
///
/// Layered hierarchy, later layers win:
///
/// 1. **Built-in defaults**: [`schema::VaxConfig::default()`]
/// 2. **User global config**: `~/.vaxtrack/config.toml`
/// 3. **Project local config**: `.vaxtrack.toml` in the current directory
/// 4. **Environment variables**: `VAXTRACK_*` overrides
///
/// File layers merge key by key. Malformed files are ignored rather than
/// aborting the command.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::{ApiConfig, UploadEnvelope, VaxConfig};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> VaxConfig {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .flatten()
        .filter_map(|path| load_toml_layer(&path));

    let mut config = resolve_layers(layers);
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Read one config file as a raw table. Files that are not valid TOML, or
/// whose values don't fit the schema, are skipped.
fn load_toml_layer(path: &Path) -> Option<toml::Table> {
    let content = fs::read_to_string(path).ok()?;
    parse_layer(&content)
}

fn parse_layer(content: &str) -> Option<toml::Table> {
    let table: toml::Table = toml::from_str(content).ok()?;
    let _: VaxConfig = toml::Value::Table(table.clone()).try_into().ok()?;
    Some(table)
}

/// Deep-merge file layers in order, then fill the gaps from defaults.
/// A key set in an earlier layer survives unless a later layer sets it.
fn resolve_layers(layers: impl IntoIterator<Item = toml::Table>) -> VaxConfig {
    let mut merged = toml::Table::new();
    for layer in layers {
        merge_tables(&mut merged, layer);
    }
    toml::Value::Table(merged).try_into().unwrap_or_default()
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    schema::vaxtrack_home().map(|home| home.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".vaxtrack.toml"))
}

pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply `VAXTRACK_*` overrides.
///
/// Supported variables:
/// - `VAXTRACK_BASE_URL`
/// - `VAXTRACK_TIMEOUT_MS`
/// - `VAXTRACK_MAX_RETRIES`
/// - `VAXTRACK_UPLOAD_ENVELOPE` (`raw` / `wrapped`)
/// - `VAXTRACK_SESSION_FILE`
/// - `VAXTRACK_LOG` (truthy / falsy)
/// - `VAXTRACK_FORMAT` (`table` / `json`)
///
/// The lookup is injected so tests don't have to mutate the process
/// environment.
fn apply_env_overrides(config: &mut VaxConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("VAXTRACK_BASE_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Some(val) = var("VAXTRACK_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = var("VAXTRACK_MAX_RETRIES")
        && let Ok(n) = val.parse::<u32>()
    {
        config.api.max_retries = n;
    }
    if let Some(val) = var("VAXTRACK_UPLOAD_ENVELOPE")
        && let Some(envelope) = parse_envelope(&val)
    {
        config.api.upload_envelope = envelope;
    }
    if let Some(val) = var("VAXTRACK_SESSION_FILE")
        && !val.is_empty()
    {
        config.session.file = val;
    }
    if let Some(val) = var("VAXTRACK_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Some(val) = var("VAXTRACK_FORMAT")
        && !val.is_empty()
    {
        config.display.format = val.to_ascii_lowercase();
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_envelope(val: &str) -> Option<UploadEnvelope> {
    match val.to_ascii_lowercase().as_str() {
        "raw" => Some(UploadEnvelope::Raw),
        "wrapped" | "vaccination_json" => Some(UploadEnvelope::Wrapped),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.vaxtrack/config.toml`.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.vaxtrack/ directory")?;
    }

    fs::write(&path, VaxConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a dotted key (e.g. `api.base_url`) in the global config file.
///
/// Starts from the existing file, or from serialized defaults when there is
/// none, so the value type of the existing key is preserved.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let source = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&VaxConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&source).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject values that no longer fit the schema (e.g. a bad enum name).
    let rendered = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<VaxConfig>(&rendered)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, rendered).context("failed to write config file")?;

    Ok(())
}

fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table for '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
