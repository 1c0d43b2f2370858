mod commands;
mod tsv;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use common::Task;
use sea_orm::DatabaseConnection;
use server::config::AppConfig;
use server::export::{DEFAULT_MIN_VOTES, ExportOptions};
use tracing_subscriber::EnvFilter;

use commands::export::EXCLUDED_SESSION_IDS_ENV;
use commands::ingest::SubmissionOptions;

#[derive(Parser)]
#[command(
    name = "votearena",
    version,
    about = "Load prompts and outputs into the vote arena and export votes for rating"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every `task-{task}.tsv` prompt file in a directory
    IngestPrompts {
        /// Directory with the prompt files
        dir: PathBuf,
    },
    /// Load a system's outputs from a submission archive
    IngestSubmission {
        /// Zip archive with `task-{task}.tsv` files (columns `id`, `text`)
        zip: PathBuf,

        /// Id the system is stored under
        #[arg(long)]
        system: String,

        /// Tasks to load, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        tasks: Vec<Task>,

        /// Do not fail when the system was ingested before
        #[arg(long)]
        system_exists_ok: bool,

        /// Fail on empty output texts instead of storing `-`
        #[arg(long)]
        reject_null_texts: bool,
    },
    /// Load the baseline archive for every known task
    IngestBaseline {
        zip: PathBuf,
    },
    /// Write `votes-{task}.json` files for the rating engine
    ExportVotes {
        #[arg(long, default_value = "scoring")]
        out_dir: PathBuf,

        /// Tasks to export, comma-separated (default: all known tasks)
        #[arg(long, value_delimiter = ',')]
        task: Vec<Task>,

        /// Session to leave out (repeatable, adds to $EXCLUDED_SESSION_IDS)
        #[arg(long = "exclude-session")]
        exclude_sessions: Vec<String>,

        /// Keep only sessions of recruited participants
        #[arg(long)]
        only_prolific: bool,

        /// Drop battles of systems with fewer counted votes
        #[arg(long, default_value_t = DEFAULT_MIN_VOTES)]
        min_votes: u64,
    },
    /// Print the counted votes per system of a task
    VoteCounts {
        #[arg(long)]
        task: Task,
    },
    /// Print ledger totals
    Stats,
}

async fn connect() -> anyhow::Result<DatabaseConnection> {
    let config = AppConfig::load().context("Failed to load config")?;
    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    server::seed::ensure_constraints(&db)
        .await
        .context("Failed to create vote constraints")?;
    Ok(db)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = connect().await?;

    match cli.command {
        Commands::IngestPrompts { dir } => commands::ingest::ingest_prompts(&db, &dir).await,
        Commands::IngestSubmission {
            zip,
            system,
            tasks,
            system_exists_ok,
            reject_null_texts,
        } => {
            let options = SubmissionOptions {
                system_id: system,
                tasks,
                system_exists_ok,
                reject_null_texts,
            };
            commands::ingest::ingest_submission(&db, &zip, &options).await
        }
        Commands::IngestBaseline { zip } => {
            commands::ingest::ingest_submission(&db, &zip, &commands::ingest::baseline_options())
                .await
        }
        Commands::ExportVotes {
            out_dir,
            task,
            exclude_sessions,
            only_prolific,
            min_votes,
        } => {
            let tasks = if task.is_empty() { Task::known() } else { task };
            let env_value = std::env::var(EXCLUDED_SESSION_IDS_ENV).ok();
            let options = ExportOptions {
                excluded_session_ids: commands::export::excluded_session_ids(
                    env_value.as_deref(),
                    &exclude_sessions,
                ),
                only_prolific,
                min_votes,
            };
            commands::export::export_votes(&db, &out_dir, &tasks, &options).await
        }
        Commands::VoteCounts { task } => commands::stats::vote_counts(&db, &task).await,
        Commands::Stats => commands::stats::stats(&db).await,
    }
}
