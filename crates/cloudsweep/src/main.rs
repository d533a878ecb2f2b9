mod app;
mod commands;
mod config;
mod output;

use anyhow::Context;
use app::{App, Source};
use clap::{Parser, Subcommand};
use config::AppConfig;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudsweep")]
#[command(about = "Inventory, search and clean up the resources of a Scaleway account", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scaleway CLI profile (defaults to the active one)
    #[arg(long, global = true, env = "CLOUDSWEEP_PROFILE")]
    profile: Option<String>,

    /// Work on a fabricated account, no credentials needed
    #[arg(long, global = true)]
    demo: bool,

    /// Resource cache database
    #[arg(long, global = true, env = "CLOUDSWEEP_DB")]
    db: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    /// File the log goes to
    #[arg(long, global = true, env = "CLOUDSWEEP_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Config file (defaults to ~/.config/cloudsweep/config.yaml)
    #[arg(long, global = true, env = "CLOUDSWEEP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover every resource of the account and cache it
    Scan,
    /// List cached resources
    List {
        /// Only this type (e.g. instance, job_run)
        #[arg(short = 't', long = "type")]
        resource_type: Option<String>,
        /// Only this project, by id or name
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Full-text search over cached resources (e.g. `type:instance region:fr-par web`)
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show one cached resource
    Show { id: String },
    /// Delete a resource from the account and the cache
    Delete {
        id: String,
        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Run a named action (start, retry, cancel, activate cockpit); lists them without a name
    Action {
        id: String,
        name: Option<String>,
        /// Do not follow job runs started by the action
        #[arg(short, long)]
        detach: bool,
    },
    /// Recent logs of a resource
    Logs {
        id: String,
        /// Number of lines
        #[arg(short = 'n', long, default_value = "100")]
        lines: usize,
    },
    /// Show version information
    Version,
}

/// Log to a file, stdout belongs to the command output.
fn init_logging(level: &str, file: &Path, debug: bool) -> anyhow::Result<()> {
    let writer = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("failed to open log file {}", file.display()))?;

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?
    };

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(writer))
        .with_env_filter(filter)
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("cloudsweep {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    let log_file = cli.log_file.clone().unwrap_or_else(|| config.logging.file.clone());
    init_logging(&config.logging.level, &log_file, cli.debug)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), demo = cli.demo, "starting cloudsweep");

    let source = if cli.demo {
        Source::Demo
    } else {
        Source::Scaleway {
            profile: cli.profile.clone().or_else(|| config.scaleway.profile.clone()),
        }
    };
    let db = match (&cli.db, &config.cache.path) {
        (Some(path), _) => path.clone(),
        (None, Some(path)) if !cli.demo => path.clone(),
        _ => config::default_db_path(cli.demo),
    };

    let app = App::open(config, source, db).await?;

    match cli.command {
        Commands::Scan => commands::scan::handle(&app).await,
        Commands::List {
            resource_type,
            project,
        } => commands::list::handle(&app, resource_type, project).await,
        Commands::Search { query } => commands::search::handle(&app, &query.join(" ")).await,
        Commands::Show { id } => commands::list::handle_show(&app, &id).await,
        Commands::Delete { id, yes } => commands::delete::handle(&app, &id, yes).await,
        Commands::Action { id, name, detach } => {
            commands::action::handle(&app, &id, name, detach).await
        }
        Commands::Logs { id, lines } => commands::logs::handle(&app, &id, lines).await,
        Commands::Version => Ok(()),
    }
}
