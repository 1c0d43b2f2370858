use std::fs;
use std::path::Path;

use anyhow::Context;
use common::Task;
use sea_orm::DatabaseConnection;
use server::export::{ExportOptions, scoring_records};
use tracing::info;

/// Session ids to leave out of every export, comma-separated.
pub const EXCLUDED_SESSION_IDS_ENV: &str = "EXCLUDED_SESSION_IDS";

/// Merge the operator's exclusion list from the environment with the ones
/// given on the command line.
pub fn excluded_session_ids(env_value: Option<&str>, from_args: &[String]) -> Vec<String> {
    let mut ids: Vec<String> = env_value
        .unwrap_or_default()
        .split(',')
        .chain(from_args.iter().map(String::as_str))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Write `votes-{task}.json` for each task into `out_dir`.
pub async fn export_votes(
    db: &DatabaseConnection,
    out_dir: &Path,
    tasks: &[Task],
    options: &ExportOptions,
) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for task in tasks {
        let records = scoring_records(db, task, options)
            .await
            .with_context(|| format!("Failed to read votes of task {task}"))?;

        let path = out_dir.join(format!("votes-{task}.json"));
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        info!(%task, records = records.len(), path = %path.display(), "Exported votes");
    }

    Ok(())
}
