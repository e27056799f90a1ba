use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use vaxtrack::cli::{self, Context};
use vaxtrack::config;
use vaxtrack::view::RegistrationForm;

#[derive(Debug, Parser)]
#[command(name = "vaxtrack")]
#[command(about = "Vaccination and inventory dashboards for public, merchant and government users")]
struct App {
    /// Output format: table (default) or json
    #[arg(long, global = true)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and open the dashboard for your role
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long, default_value = "")]
        middle_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        mobile_phone: String,
        #[arg(long, default_value = "")]
        home_address: String,
        /// public, merchant or government
        #[arg(long)]
        role: Option<String>,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
        /// Read from stdin when omitted
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Show the stored session
    Whoami,
    /// Open a page by id, route or title (e.g. merchant-dashboard)
    Open { page: String },
    /// Open a role's dashboard (defaults to your own)
    Dashboard { role: Option<String> },
    /// Show the audit log
    Audit,
    /// Upload a vaccination record from a .json file
    Upload { file: PathBuf },
    /// Search the inventory
    Search { keyword: String },
    /// Show or update your profile
    Profile {
        #[command(subcommand)]
        action: Option<RecordAction>,
    },
    /// Show or update your identifiers
    Identifiers {
        #[command(subcommand)]
        action: Option<RecordAction>,
    },
    /// Show recent API activity
    History {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum RecordAction {
    /// Show the current values
    Show,
    /// Update fields given as key=value
    Set {
        #[arg(required = true)]
        fields: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default ~/.vaxtrack/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value by dotted key (e.g. api.base_url)
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn record_fields(action: &Option<RecordAction>) -> Option<&[String]> {
    match action {
        Some(RecordAction::Set { fields }) => Some(fields.as_slice()),
        Some(RecordAction::Show) | None => None,
    }
}

fn main() -> Result<ExitCode> {
    let app = App::parse();
    let config = config::load();
    if !config.display.color {
        colored::control::set_override(false);
    }
    let ctx = Context::new(config, app.format.as_deref());

    match app.command {
        Commands::Login { email, password } => cli::run_login(&ctx, &email, password),
        Commands::Logout => cli::run_logout(&ctx),
        Commands::Register {
            first_name,
            middle_name,
            last_name,
            email,
            mobile_phone,
            home_address,
            role,
            password,
            confirm_password,
        } => {
            let form = RegistrationForm {
                first_name,
                middle_name,
                last_name,
                email,
                mobile_phone,
                password: password.unwrap_or_default(),
                confirm_password: confirm_password.unwrap_or_default(),
                home_address,
                desired_role: role,
            };
            cli::run_register(&ctx, form)
        }
        Commands::Whoami => cli::run_whoami(&ctx).map(|()| ExitCode::SUCCESS),
        Commands::Open { page } => cli::run_open(&ctx, &page),
        Commands::Dashboard { role } => cli::run_dashboard(&ctx, role.as_deref()),
        Commands::Audit => cli::run_audit(&ctx),
        Commands::Upload { file } => cli::run_upload(&ctx, &file),
        Commands::Search { keyword } => cli::run_search(&ctx, &keyword),
        Commands::Profile { action } => cli::run_profile(&ctx, record_fields(&action)),
        Commands::Identifiers { action } => cli::run_identifiers(&ctx, record_fields(&action)),
        Commands::History { limit } => cli::run_history(&ctx, limit).map(|()| ExitCode::SUCCESS),
        Commands::Config { action } => {
            let result = match action {
                ConfigAction::Show => cli::run_config_show(),
                ConfigAction::Init { force } => cli::run_config_init(force),
                ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
                ConfigAction::Reset => cli::run_config_reset(),
            };
            result.map(|()| ExitCode::SUCCESS)
        }
    }
}
