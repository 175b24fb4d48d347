mod cmd;
mod output;
mod root;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tickler",
    about = "Recurring issues and due-date reminders for GitHub, driven by directives in issue bodies",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest .tickler.yaml, else built-in defaults)
    #[arg(long, global = true, env = "TICKLER_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every open issue and apply the resulting actions
    Run {
        /// GitHub token with issues read/write access
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        /// Repository as owner/name
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repository: String,

        /// Don't actually do anything, just log what would be done
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Evaluate as of this instant (RFC 3339) instead of the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Evaluate a single issue body offline and show the planned actions
    Inspect {
        /// File holding the issue body, or - for stdin
        file: PathBuf,

        /// Issue number used for provenance and templates
        #[arg(long, default_value = "0")]
        number: u64,

        /// Issue title
        #[arg(long, default_value = "")]
        title: String,

        /// Creation time (RFC 3339, default: --now)
        #[arg(long)]
        created: Option<DateTime<Utc>>,

        /// Last update time (RFC 3339, default: creation time)
        #[arg(long)]
        updated: Option<DateTime<Utc>>,

        /// Labels already on the issue (comma separated)
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,

        /// Evaluate as of this instant (RFC 3339) instead of the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Show or validate the effective configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = root::load_config(cli.config.as_deref()).and_then(|(config, path)| {
        match cli.command {
            Commands::Run {
                token,
                repository,
                dry_run,
                now,
            } => cmd::run::run(
                &config,
                &token,
                &repository,
                dry_run,
                now.unwrap_or_else(Utc::now),
                cli.json,
            ),
            Commands::Inspect {
                file,
                number,
                title,
                created,
                updated,
                labels,
                now,
            } => cmd::inspect::run(
                &config,
                cmd::inspect::InspectArgs {
                    file,
                    number,
                    title,
                    created,
                    updated,
                    labels,
                    now: now.unwrap_or_else(Utc::now),
                },
                cli.json,
            ),
            Commands::Config { subcommand } => {
                cmd::config::run(&config, path.as_deref(), subcommand, cli.json)
            }
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
