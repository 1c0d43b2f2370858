//! Catalog Store: prompts, systems and their outputs.
//!
//! The serving path only reads from here. Writes come from the ingestion
//! collaborators (the `votearena` CLI).

use std::collections::{BTreeSet, HashMap};

use common::Task;
use sea_orm::sea_query::{OnConflict, Query, SelectStatement};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{output, prompt, system};

/// Ids of the prompts that belong to `task`, for use in `IN (...)` filters.
pub(crate) fn prompt_ids_in_task(task: &Task) -> SelectStatement {
    Query::select()
        .column(prompt::Column::Id)
        .from(prompt::Entity)
        .and_where(prompt::Column::Task.eq(task.as_str()))
        .to_owned()
}

pub async fn prompts_for_task<C: ConnectionTrait>(
    db: &C,
    task: &Task,
) -> Result<Vec<prompt::Model>, DbErr> {
    prompt::Entity::find()
        .filter(prompt::Column::Task.eq(task.as_str()))
        .all(db)
        .await
}

pub async fn outputs_for_task<C: ConnectionTrait>(
    db: &C,
    task: &Task,
) -> Result<Vec<output::Model>, DbErr> {
    output::Entity::find()
        .filter(output::Column::PromptId.in_subquery(prompt_ids_in_task(task)))
        .order_by_asc(output::Column::PromptId)
        .order_by_asc(output::Column::SystemId)
        .all(db)
        .await
}

/// Systems with at least one output in `task`.
pub async fn system_ids_for_task<C: ConnectionTrait>(
    db: &C,
    task: &Task,
) -> Result<Vec<String>, DbErr> {
    output::Entity::find()
        .select_only()
        .column(output::Column::SystemId)
        .filter(output::Column::PromptId.in_subquery(prompt_ids_in_task(task)))
        .group_by(output::Column::SystemId)
        .order_by_asc(output::Column::SystemId)
        .into_tuple::<String>()
        .all(db)
        .await
}

pub async fn find_prompt<C: ConnectionTrait>(
    db: &C,
    prompt_id: &str,
) -> Result<Option<prompt::Model>, DbErr> {
    prompt::Entity::find_by_id(prompt_id.to_string()).one(db).await
}

pub async fn find_output<C: ConnectionTrait>(
    db: &C,
    prompt_id: &str,
    system_id: &str,
) -> Result<Option<output::Model>, DbErr> {
    output::Entity::find_by_id((prompt_id.to_string(), system_id.to_string()))
        .one(db)
        .await
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid prompt '{prompt_id}': {reason}")]
    InvalidPrompt { prompt_id: String, reason: String },
    #[error("System '{0}' already exists")]
    SystemExists(String),
    #[error(
        "Submitted prompt ids for task '{task}' do not match the catalog. Missing: {missing:?}. Extra: {extra:?}"
    )]
    PromptSetMismatch {
        task: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },
    #[error("Null output text for system '{system_id}' and task '{task}', prompts: {prompt_ids:?}")]
    NullTexts {
        system_id: String,
        task: String,
        prompt_ids: Vec<String>,
    },
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Check the prompt id and that exactly one prompt content shape is set.
pub fn validate_prompt(prompt: &prompt::Model) -> Result<(), CatalogError> {
    let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    let invalid = |reason: &str| CatalogError::InvalidPrompt {
        prompt_id: prompt.id.clone(),
        reason: reason.to_string(),
    };

    // Output keys are `{prompt}-{system}` split on the first `-`.
    if prompt.id.is_empty() || prompt.id.contains('-') {
        return Err(invalid("the id must be non-empty and must not contain `-`"));
    }

    if set(&prompt.word1) {
        if !set(&prompt.word2) || set(&prompt.headline) || set(&prompt.prompt) || set(&prompt.url) {
            return Err(invalid(
                "if `word1` is set, `word2` must be set and `headline`, `prompt` and `url` must be empty",
            ));
        }
    } else if set(&prompt.headline) {
        if set(&prompt.word2) || set(&prompt.prompt) || set(&prompt.url) {
            return Err(invalid(
                "if `headline` is set, `word1`, `word2`, `prompt` and `url` must be empty",
            ));
        }
    } else if set(&prompt.url) {
        if set(&prompt.word2) {
            return Err(invalid(
                "if `url` is set, `word1`, `word2` and `headline` must be empty",
            ));
        }
    } else {
        return Err(invalid(
            "one of `word1`+`word2`, `headline` or `url` must be set",
        ));
    }

    Ok(())
}

/// Insert prompts, skipping ids that already exist. Returns how many were new.
pub async fn insert_prompts<C: ConnectionTrait>(
    db: &C,
    prompts: Vec<prompt::Model>,
) -> Result<u64, CatalogError> {
    for prompt in &prompts {
        validate_prompt(prompt)?;
    }

    let mut inserted = 0u64;
    for prompt in prompts {
        let result = prompt::Entity::insert(prompt.into_active_model())
            .on_conflict(
                OnConflict::column(prompt::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(rows) => inserted += rows,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(inserted)
}

/// Register a competing system.
pub async fn insert_system<C: ConnectionTrait>(
    db: &C,
    system_id: &str,
    exists_ok: bool,
) -> Result<(), CatalogError> {
    let existing = system::Entity::find_by_id(system_id.to_string())
        .one(db)
        .await?;

    if existing.is_some() {
        if exists_ok {
            info!(system_id, "System already exists, not adding it again");
            return Ok(());
        }
        return Err(CatalogError::SystemExists(system_id.to_string()));
    }

    system::ActiveModel {
        id: Set(system_id.to_string()),
    }
    .insert(db)
    .await?;

    Ok(())
}

/// Store one system's outputs for a whole task.
///
/// The submitted prompt ids must be exactly the catalog's prompt ids for the
/// task. `None` texts are replaced with `-` when `accept_null_texts` is set
/// and rejected otherwise. A re-ingested output replaces the previous text,
/// so the latest submission of a system wins.
pub async fn upsert_task_outputs<C: ConnectionTrait>(
    db: &C,
    system_id: &str,
    task: &Task,
    texts: HashMap<String, Option<String>>,
    accept_null_texts: bool,
) -> Result<u64, CatalogError> {
    let reference: BTreeSet<String> = prompts_for_task(db, task)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    let submitted: BTreeSet<String> = texts.keys().cloned().collect();

    if submitted != reference {
        return Err(CatalogError::PromptSetMismatch {
            task: task.to_string(),
            missing: reference.difference(&submitted).cloned().collect(),
            extra: submitted.difference(&reference).cloned().collect(),
        });
    }

    let mut null_prompt_ids: Vec<String> = texts
        .iter()
        .filter(|(_, text)| text.is_none())
        .map(|(id, _)| id.clone())
        .collect();
    null_prompt_ids.sort();

    if !null_prompt_ids.is_empty() {
        if !accept_null_texts {
            return Err(CatalogError::NullTexts {
                system_id: system_id.to_string(),
                task: task.to_string(),
                prompt_ids: null_prompt_ids,
            });
        }
        warn!(
            system_id,
            %task,
            prompt_ids = ?null_prompt_ids,
            "Null output texts, storing '-' instead"
        );
    }

    if texts.is_empty() {
        return Ok(0);
    }

    let models = texts.into_iter().map(|(prompt_id, text)| output::ActiveModel {
        prompt_id: Set(prompt_id),
        system_id: Set(system_id.to_string()),
        text: Set(text.unwrap_or_else(|| "-".to_string())),
    });

    let rows = output::Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([output::Column::PromptId, output::Column::SystemId])
                .update_column(output::Column::Text)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(rows)
}
