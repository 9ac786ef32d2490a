//! snowscope CLI - render the account-usage dashboard in a terminal.
//!
//! Usage:
//!   snowscope run [--start 2024-01-01 --end 2024-01-31] [--connection NAME]
//!   snowscope panels
//!   snowscope sql [--panel SLUG]
//!
//! Examples:
//!   snowscope run
//!   snowscope run --start 2024-01-01 --end 2024-01-31 --format json
//!   snowscope sql --panel credits_used

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use snowscope::config::{ConnectionConfig, Settings};
use snowscope::dashboard::{self, DateRange};
use snowscope::render::{self, TextRenderer};
use snowscope::session::protocol::ConnectionParams;
use snowscope::session::{LoginOptions, Session, WorkerClient};

#[derive(Parser)]
#[command(name = "snowscope")]
#[command(about = "snowscope - a Snowflake account-usage dashboard")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to the standard search order)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute every panel and render the report
    Run {
        /// Start of the date range (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End of the date range (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Named connection from the config file
        #[arg(short, long)]
        connection: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// List the panels in the catalogue
    Panels,

    /// Print the SQL each panel would execute
    Sql {
        /// Only this panel (by slug)
        #[arg(short, long)]
        panel: Option<String>,

        /// Start of the date range (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End of the date range (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

#[derive(Clone, ValueEnum)]
enum Format {
    /// Aligned plain text
    Text,
    /// The full report as JSON
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Run {
            start,
            end,
            connection,
            format,
        } => cmd_run(settings, start, end, connection, format).await,
        Commands::Panels => cmd_panels(&settings),
        Commands::Sql { panel, start, end } => cmd_sql(&settings, panel, start, end),
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, snowscope::config::SettingsError> {
    match path {
        Some(p) => Settings::from_file(p),
        None => Settings::load(),
    }
}

/// Resolve the date range from explicit bounds or the configured default
/// trailing window.
fn resolve_range(
    settings: &Settings,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DateRange, String> {
    match (start, end) {
        (Some(s), Some(e)) => DateRange::new(s, e).map_err(|e| e.to_string()),
        (None, None) => Ok(DateRange::trailing_days(
            settings.dashboard.default_window_days.max(1) as u64,
        )),
        _ => Err("--start and --end must be given together".to_string()),
    }
}

/// Resolve connection parameters: a named connection, the config default,
/// or the SNOWSCOPE_* environment variables.
fn resolve_connection(
    settings: &Settings,
    name: Option<&str>,
) -> Result<ConnectionParams, String> {
    if let Some(name) = name {
        let conn = settings.get_connection(name).map_err(|e| e.to_string())?;
        return conn.to_params().map_err(|e| e.to_string());
    }

    if let Some((_, conn)) = settings.default_connection() {
        return conn.to_params().map_err(|e| e.to_string());
    }

    ConnectionConfig::from_env()
        .map(|c| c.to_params())
        .map_err(|e| e.to_string())
}

async fn cmd_run(
    settings: Settings,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    connection: Option<String>,
    format: Format,
) -> ExitCode {
    let range = match resolve_range(&settings, start, end) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Invalid date range: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let params = match resolve_connection(&settings, connection.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Connection error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match WorkerClient::spawn_with_settings(&settings).await {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Worker error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = LoginOptions {
        ttl_seconds: settings.session.credential_ttl_seconds,
        label: settings.session.label.clone(),
    };

    let session = match Session::login(client, params, options).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Login failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = dashboard::run(&session, &range).await;

    match format {
        Format::Text => {
            let mut renderer = TextRenderer::stdout();
            if let Err(e) = render::render(&mut renderer, &report) {
                eprintln!("Render error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        Format::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Serialization error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    if report.succeeded() == 0 {
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn cmd_panels(settings: &Settings) -> ExitCode {
    let range = DateRange::trailing_days(settings.dashboard.default_window_days.max(1) as u64);

    println!("Panels:");
    for panel in dashboard::catalog::panels(&range) {
        println!("  {:<32} {:?} - {}", panel.slug, panel.region, panel.title);
    }

    ExitCode::SUCCESS
}

fn cmd_sql(
    settings: &Settings,
    slug: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ExitCode {
    let range = match resolve_range(settings, start, end) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Invalid date range: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let panels = dashboard::catalog::panels(&range);

    if let Some(slug) = &slug {
        match panels.iter().find(|p| p.slug == slug) {
            Some(panel) => {
                println!("{}", panel.sql());
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("Unknown panel: {}", slug);
                ExitCode::FAILURE
            }
        }
    } else {
        for panel in &panels {
            println!("-- {} ({})", panel.title, panel.slug);
            println!("{}", panel.sql());
            println!();
        }
        ExitCode::SUCCESS
    }
}
