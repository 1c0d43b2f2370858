use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use common::Task;
use sea_orm::{DatabaseConnection, TransactionTrait};
use server::catalog;
use server::entity::prompt;
use tracing::{info, warn};

use crate::tsv::Table;

pub const BASELINE_SYSTEM_ID: &str = "baseline";

const PROMPT_COLUMNS: [&str; 5] = ["word1", "word2", "headline", "url", "prompt"];
const TASK_FILE_PREFIX: &str = "task-";

/// Task named by a `task-{task}.tsv` file name.
fn task_from_file_name(name: &str) -> anyhow::Result<Task> {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Invalid file name {name}"))?;
    stem.strip_prefix(TASK_FILE_PREFIX)
        .unwrap_or(stem)
        .parse()
        .with_context(|| format!("File {name} does not name a task"))
}

fn prompts_from_table(table: &Table, task: &Task) -> anyhow::Result<Vec<prompt::Model>> {
    table.require_columns(&["id"])?;
    if !PROMPT_COLUMNS.iter().any(|c| table.has_column(c)) {
        bail!("None of the prompt columns {PROMPT_COLUMNS:?} is present");
    }

    table
        .rows()
        .map(|row| {
            Ok(prompt::Model {
                id: row.get("id").context("Prompt without id")?,
                task: task.to_string(),
                word1: row.get("word1"),
                word2: row.get("word2"),
                headline: row.get("headline"),
                url: row.get("url"),
                prompt: row.get("prompt"),
            })
        })
        .collect()
}

/// Load every `*.tsv` prompt file in `dir`.
pub async fn ingest_prompts(db: &DatabaseConnection, dir: &Path) -> anyhow::Result<()> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tsv"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("No .tsv files in {}", dir.display());
    }

    let mut prompts = Vec::new();
    for path in &paths {
        let name = path.to_string_lossy();
        let task = task_from_file_name(&name)?;
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {name}"))?;
        let table = Table::parse(&content).with_context(|| format!("Failed to parse {name}"))?;
        let parsed =
            prompts_from_table(&table, &task).with_context(|| format!("Invalid prompts in {name}"))?;
        info!(file = %name, %task, prompts = parsed.len(), "Read prompt file");
        prompts.extend(parsed);
    }

    let txn = db.begin().await?;
    let inserted = catalog::insert_prompts(&txn, prompts).await?;
    txn.commit().await?;

    println!("Number of rows affected: {inserted}");
    Ok(())
}

pub struct SubmissionOptions {
    pub system_id: String,
    pub tasks: Vec<Task>,
    pub system_exists_ok: bool,
    pub reject_null_texts: bool,
}

/// Read `task-{task}.tsv` of a submission archive as prompt id to text.
fn read_task_texts<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    task: &Task,
) -> anyhow::Result<Option<HashMap<String, Option<String>>>> {
    let name = format!("{TASK_FILE_PREFIX}{task}.tsv");
    let mut file = match archive.by_name(&name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to open {name}")),
    };

    let mut content = String::new();
    file.read_to_string(&mut content)
        .with_context(|| format!("Failed to read {name}"))?;

    let table = Table::parse(&content).with_context(|| format!("Failed to parse {name}"))?;
    table
        .require_columns(&["id", "text"])
        .with_context(|| format!("Invalid submission file {name}"))?;

    let mut texts = HashMap::with_capacity(table.len());
    for row in table.rows() {
        let id = row.get("id").with_context(|| format!("Row without id in {name}"))?;
        if texts.insert(id.clone(), row.get("text")).is_some() {
            bail!("Duplicate prompt id {id} in {name}");
        }
    }
    Ok(Some(texts))
}

/// Store one system's outputs from a submission archive, all tasks in one
/// transaction.
pub async fn ingest_submission(
    db: &DatabaseConnection,
    path: &Path,
    options: &SubmissionOptions,
) -> anyhow::Result<()> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Invalid ZIP archive {}", path.display()))?;

    let mut per_task = Vec::with_capacity(options.tasks.len());
    for task in &options.tasks {
        match read_task_texts(&mut archive, task)? {
            Some(texts) => per_task.push((task, texts)),
            None => warn!(%task, "No file for task in the submission, skipping"),
        }
    }
    if per_task.is_empty() {
        bail!("The submission has no file for any of the tasks {:?}", options.tasks);
    }

    let txn = db.begin().await?;
    catalog::insert_system(&txn, &options.system_id, options.system_exists_ok).await?;

    let mut affected = 0;
    for (task, texts) in per_task {
        let rows = catalog::upsert_task_outputs(
            &txn,
            &options.system_id,
            task,
            texts,
            !options.reject_null_texts,
        )
        .await?;
        info!(system_id = %options.system_id, %task, rows, "Stored outputs");
        affected += rows;
    }

    txn.commit().await?;

    println!("Number of rows affected: {affected}");
    Ok(())
}

pub fn baseline_options() -> SubmissionOptions {
    SubmissionOptions {
        system_id: BASELINE_SYSTEM_ID.to_string(),
        tasks: Task::known(),
        system_exists_ok: true,
        reject_null_texts: false,
    }
}
