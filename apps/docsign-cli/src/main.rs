//! docsign binary
//!
//! `docsign project` prints the signing view for a document and actor as JSON.
//! `docsign merge` merges PDFs onto a base, one history entry per `--group`.
//!
//! Logs go to stderr so stdout stays machine-readable.

use clap::{Parser, Subcommand};
use docsign_cli::commands::{parse_group, run_merge, run_project, MergeRequest};
use docsign_cli::config::{Config, LoggingConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "docsign")]
#[command(version, about = "Signing views and ordered PDF merges")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the actor's steps and project the fields they may see
    Project {
        /// Document JSON (flow steps and mappingData)
        #[arg(long)]
        document: PathBuf,

        /// Actor JSON
        #[arg(long)]
        actor: PathBuf,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Merge PDFs onto a base document
    Merge {
        /// Base PDF
        #[arg(long)]
        base: PathBuf,

        /// Comma-separated PDFs merged as one history entry; repeatable, applied in order
        #[arg(long = "group", required = true)]
        groups: Vec<String>,

        /// Remove this history entry (0-based) after all groups are applied
        #[arg(long)]
        drop: Option<usize>,

        /// Where to write the merged PDF
        #[arg(short, long)]
        output: PathBuf,

        /// Print progress to stderr
        #[arg(long)]
        progress: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_tracing(&config.logging, cli.log_json);

    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Project {
            document,
            actor,
            pretty,
        } => {
            let view = run_project(&document, &actor, config.resolver)?;
            let json = if pretty {
                serde_json::to_string_pretty(&view)?
            } else {
                serde_json::to_string(&view)?
            };
            println!("{}", json);
        }
        Command::Merge {
            base,
            groups,
            drop,
            output,
            progress,
        } => {
            let request = MergeRequest {
                base,
                groups: groups.iter().map(|g| parse_group(g)).collect(),
                drop,
                output,
            };
            let report = run_merge(&request, config.merge, |p| {
                if progress {
                    eprintln!("[{:>3}/{}] {}", p.current, p.total, p.message);
                }
            })
            .await?;
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig, force_json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let json = force_json || logging.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}
