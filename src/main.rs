//! # treedoc CLI
//!
//! The `treedoc` binary compiles a hierarchy of tracker issues into one
//! self-contained HTML report.
//!
//! ## Usage
//!
//! ```bash
//! treedoc --config ./config/treedoc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `treedoc compile <KEY>` | Compile the tree below `<KEY>` into `{KEY}_Report.html` |
//! | `treedoc check` | Verify tracker connectivity and credentials |
//!
//! ## Examples
//!
//! ```bash
//! # Verify the tracker is reachable with the configured credentials
//! treedoc check --config ./config/treedoc.toml
//!
//! # Compile an epic and everything below it
//! treedoc compile PROJ-1 --config ./config/treedoc.toml
//!
//! # Count nodes without writing anything
//! treedoc compile PROJ-1 --dry-run
//!
//! # Machine-readable progress for CI logs
//! treedoc compile PROJ-1 --progress json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use treedoc::compile::run_compile;
use treedoc::config::load_config;
use treedoc::fetcher::{check_connection, TrackerCredentials};
use treedoc::progress::ProgressMode;

/// treedoc — compile a hierarchy of remote issue records into one
/// self-contained HTML report.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Credentials come from the `JIRA_EMAIL` and `JIRA_API_TOKEN`
/// environment variables.
#[derive(Parser)]
#[command(
    name = "treedoc",
    about = "Compile a hierarchy of remote issue records into one self-contained HTML report",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/treedoc.toml`. Tracker, scope, and report
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/treedoc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Compile the issue tree below a root key into an HTML report.
    ///
    /// Bootstraps the issue index for the configured JQL scope, walks the
    /// tree in pre-order fetching each issue's rendered description, and
    /// writes `{KEY}_Report.html` to the output directory. A root key
    /// outside the scope produces an empty compile, not an error.
    Compile {
        /// Root issue key, e.g. `PROJ-1`.
        root_key: String,

        /// Dry run — print node and link counts without writing the report.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a TTY, otherwise `off`.
        #[arg(long)]
        progress: Option<String>,

        /// Override the configured output directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Verify tracker connectivity and credentials.
    ///
    /// Calls the tracker's server-info endpoint and prints its name and
    /// version. Useful before a long compile.
    Check,
}

fn parse_progress_mode(raw: Option<&str>) -> Result<ProgressMode> {
    match raw {
        None => Ok(ProgressMode::default_for_tty()),
        Some("off") => Ok(ProgressMode::Off),
        Some("human") => Ok(ProgressMode::Human),
        Some("json") => Ok(ProgressMode::Json),
        Some(other) => anyhow::bail!(
            "Unknown progress mode: '{}'. Must be off, human, or json.",
            other
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Compile {
            root_key,
            dry_run,
            progress,
            output,
        } => {
            let mode = parse_progress_mode(progress.as_deref())?;
            run_compile(&config, &root_key, dry_run, mode, output).await?;
        }
        Commands::Check => {
            let creds = TrackerCredentials::from_env()?;
            let info = check_connection(&config.tracker, &creds).await?;
            println!("check {}", config.tracker.host());
            println!("  server: {}", info);
            println!("ok");
        }
    }

    Ok(())
}
