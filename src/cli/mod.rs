//! CLI command implementations for vaxtrack.
//!
//! Provides subcommand handlers for:
//! - `vaxtrack login|logout|register|whoami`: session management
//! - `vaxtrack open <page>` / `dashboard [role]` / `audit`: page activation
//! - `vaxtrack upload <file>` / `search <keyword>`: page actions
//! - `vaxtrack profile|identifiers [show|set k=v…]`: account records
//! - `vaxtrack history`: recent API activity
//! - `vaxtrack config show|init|set|reset`: configuration management

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use serde_json::{Map, Value};

use crate::activity::{ActivityEntry, ActivityLog};
use crate::api::ApiClient;
use crate::config::{self, VaxConfig};
use crate::router::{self, Page};
use crate::session::{Role, SessionStore, role_label};
use crate::view::render::truncate;
use crate::view::{Outcome, OutputFormat, RegistrationForm, TerminalRenderer, ViewController};

pub type Controller = ViewController<ApiClient, TerminalRenderer>;

/// Effective config plus the output format chosen for this invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: VaxConfig,
    pub format: OutputFormat,
}

impl Context {
    /// `format` from the command line wins over `display.format`.
    pub fn new(config: VaxConfig, format: Option<&str>) -> Self {
        let format = OutputFormat::from_str_opt(format.or(Some(config.display.format.as_str())));
        Self { config, format }
    }

    pub fn session(&self) -> SessionStore {
        match self.config.session.resolved_path() {
            Some(path) => SessionStore::open(path),
            None => SessionStore::in_memory(),
        }
    }

    pub fn activity_log(&self) -> ActivityLog {
        match self.config.logging.resolved_path() {
            Some(path) if self.config.logging.enabled => ActivityLog::at(path),
            _ => ActivityLog::disabled(),
        }
    }

    pub fn controller(&self) -> Controller {
        let client = ApiClient::from_config(&self.config.api).with_activity_log(self.activity_log());
        ViewController::new(client, self.session(), TerminalRenderer::new(self.format))
    }
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Follow a redirect produced by a flow, unless it points back at login.
fn follow(controller: &mut Controller, outcome: Outcome) -> Outcome {
    match outcome.redirect() {
        Some(page) if page != Page::Login => controller.activate(page),
        _ => outcome,
    }
}

// ---------------------------------------------------------------------------
// vaxtrack login | logout | register | whoami
// ---------------------------------------------------------------------------

/// Log in and open the dashboard for the returned role.
pub fn run_login(ctx: &Context, email: &str, password: Option<String>) -> Result<ExitCode> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password")?,
    };

    let mut controller = ctx.controller();
    let outcome = controller.login(email, &password);
    let outcome = follow(&mut controller, outcome);
    Ok(exit_code(&outcome))
}

pub fn run_logout(ctx: &Context) -> Result<ExitCode> {
    let outcome = ctx.controller().logout();
    Ok(exit_code(&outcome))
}

pub fn run_register(ctx: &Context, mut form: RegistrationForm) -> Result<ExitCode> {
    if form.password.is_empty() {
        form.password = prompt("Password")?;
    }
    if form.confirm_password.is_empty() {
        form.confirm_password = prompt("Confirm password")?;
    }

    let outcome = ctx.controller().register(&form);
    Ok(exit_code(&outcome))
}

/// Show what the stored session says, without calling the API.
pub fn run_whoami(ctx: &Context) -> Result<()> {
    let store = ctx.session();
    let session = store.session();
    let landing = router::destination_for_session(&session);
    let raw_role = store.raw_role().unwrap_or_default();

    if ctx.format == OutputFormat::Json {
        let value = serde_json::json!({
            "authenticated": session.is_authenticated(),
            "role": role_label(raw_role),
            "landing": landing.id(),
            "session_file": store.path().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if !session.is_authenticated() {
        println!("{}", "Not logged in.".yellow());
        println!("  {}", "Run `vaxtrack login <email>` to sign in.".dimmed());
        return Ok(());
    }

    println!("{}", "Current Session".bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Role:   ".bold(), role_label(raw_role));
    println!("  {} {}", "Landing:".bold(), landing.id());
    if let Some(path) = store.path() {
        println!("  {} {}", "Stored: ".bold(), path.display().to_string().dimmed());
    }
    if session.role == Role::Unknown {
        println!(
            "  {}",
            "Unrecognized role; dashboards fall back to the login page.".yellow()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// vaxtrack open | dashboard | audit
// ---------------------------------------------------------------------------

/// Open a page by id, route (`merchant-dashboard.html`) or title.
pub fn run_open(ctx: &Context, target: &str) -> Result<ExitCode> {
    let Some(page) = Page::resolve(target) else {
        let known: Vec<&str> = Page::ALL.iter().map(|p| p.id()).collect();
        bail!("unknown page '{target}' (expected one of: {})", known.join(", "));
    };

    let outcome = ctx.controller().activate(page);
    Ok(exit_code(&outcome))
}

/// Open a role's dashboard, or the session's own when no role is given.
pub fn run_dashboard(ctx: &Context, role: Option<&str>) -> Result<ExitCode> {
    let mut controller = ctx.controller();
    let outcome = match role {
        Some(raw) => {
            let role = Role::parse(raw);
            if role == Role::Unknown {
                bail!("unknown role '{raw}' (expected public, merchant or government)");
            }
            controller.activate(router::destination_for(role))
        }
        None => controller.activate_home(),
    };
    Ok(exit_code(&outcome))
}

pub fn run_audit(ctx: &Context) -> Result<ExitCode> {
    let outcome = ctx.controller().activate(Page::AdminReports);
    Ok(exit_code(&outcome))
}

// ---------------------------------------------------------------------------
// vaxtrack upload | search
// ---------------------------------------------------------------------------

pub fn run_upload(ctx: &Context, file: &Path) -> Result<ExitCode> {
    let outcome = ctx.controller().upload(file);
    Ok(exit_code(&outcome))
}

pub fn run_search(ctx: &Context, keyword: &str) -> Result<ExitCode> {
    let outcome = ctx.controller().search(keyword);
    Ok(exit_code(&outcome))
}

// ---------------------------------------------------------------------------
// vaxtrack profile | identifiers
// ---------------------------------------------------------------------------

/// `show` when `fields` is `None`, otherwise update with `key=value` pairs.
pub fn run_profile(ctx: &Context, fields: Option<&[String]>) -> Result<ExitCode> {
    let mut controller = ctx.controller();
    let outcome = match fields {
        None => controller.activate(Page::Profile),
        Some(pairs) => controller.update_profile(&parse_fields(pairs)?),
    };
    Ok(exit_code(&outcome))
}

pub fn run_identifiers(ctx: &Context, fields: Option<&[String]>) -> Result<ExitCode> {
    let mut controller = ctx.controller();
    let outcome = match fields {
        None => controller.activate(Page::Identifiers),
        Some(pairs) => controller.update_identifiers(&parse_fields(pairs)?),
    };
    Ok(exit_code(&outcome))
}

/// Parse `key=value` pairs. Values that parse as JSON keep their type
/// (`age=42`, `verified=true`); anything else is a string.
pub fn parse_fields(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("expected key=value, got '{pair}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty key in '{pair}'");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}

// ---------------------------------------------------------------------------
// vaxtrack history
// ---------------------------------------------------------------------------

/// Show the most recent API calls from the activity log.
pub fn run_history(ctx: &Context, limit: usize) -> Result<()> {
    let log = ctx.activity_log();
    if log.path().is_none() {
        println!(
            "{}",
            "Activity logging is disabled (logging.enabled = false).".yellow()
        );
        return Ok(());
    }

    let entries = log.recent(limit);
    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => print_history_table(&entries),
    }
    Ok(())
}

fn print_history_table(entries: &[ActivityEntry]) {
    if entries.is_empty() {
        println!(
            "{}",
            "No activity yet. API calls made by vaxtrack are listed here.".yellow()
        );
        return;
    }

    println!("{}", "Recent API Activity".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {:<20} {:<6} {:<32} {:>6} {:>5} {:>8}",
        "Time", "Method", "Path", "Status", "Tries", "Latency"
    );
    println!("  {}", "-".repeat(82));

    for (i, entry) in entries.iter().enumerate() {
        let status = entry
            .status
            .map(|s| s.to_string())
            .or_else(|| entry.error.clone())
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "  {:<20} {:<6} {:<32} {:>6} {:>5} {:>6}ms",
            short_timestamp(&entry.timestamp),
            entry.method,
            truncate(&entry.path, 32),
            status,
            entry.attempts,
            entry.latency_ms,
        );

        if !entry.success {
            println!("{}", line.red());
        } else if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

// ---------------------------------------------------------------------------
// vaxtrack config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective vaxtrack Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.vaxtrack/config.toml");
    print_source(project_exists, ".vaxtrack.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "VAXTRACK_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.vaxtrack/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point vaxtrack at your API.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read one line from stdin after printing `label` to stderr.
fn prompt(label: &str) -> Result<String> {
    eprint!("{label}: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("failed to read {}", label.to_lowercase()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// `2024-03-01T10:15:30.123+00:00` → `2024-03-01 10:15:30`.
fn short_timestamp(ts: &str) -> String {
    ts.get(..19)
        .map(|s| s.replacen('T', " ", 1))
        .unwrap_or_else(|| ts.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
