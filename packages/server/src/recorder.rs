//! Vote Recorder: the only writer of the vote ledger.

use std::collections::HashSet;

use chrono::Utc;
use common::{OutputKey, Task, VoteValue};
use sea_orm::*;
use tracing::{debug, info};

use crate::entity::vote;
use crate::error::AppError;
use crate::selection::{self, Battle};
use crate::{catalog, ledger};

/// A judgement as submitted, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSubmission {
    pub prompt_id: String,
    pub system_id_a: String,
    pub system_id_b: String,
    pub vote: VoteValue,
    pub is_offensive_a: bool,
    pub is_offensive_b: bool,
}

impl VoteSubmission {
    /// The same judgement with the systems in ledger order
    /// (`system_id_a < system_id_b`, compared byte-wise).
    pub fn canonical(self) -> Self {
        if self.system_id_a <= self.system_id_b {
            return self;
        }
        Self {
            prompt_id: self.prompt_id,
            system_id_a: self.system_id_b,
            system_id_b: self.system_id_a,
            vote: self.vote.mirrored(),
            is_offensive_a: self.is_offensive_b,
            is_offensive_b: self.is_offensive_a,
        }
    }
}

/// Record a vote and pick the battle that replaces it in the client's queue.
///
/// `ignored` is the client's exclusion list. Both voted outputs are added to
/// it for the replacement, which comes from the prompt's task. Returns `None`
/// when the session has nothing left to annotate there.
pub async fn record_vote(
    db: &DatabaseConnection,
    session_id: &str,
    submission: VoteSubmission,
    mut ignored: HashSet<OutputKey>,
    randomize_sides: bool,
) -> Result<Option<Battle>, AppError> {
    if submission.system_id_a == submission.system_id_b {
        return Err(AppError::Validation(
            "system_id_a and system_id_b must differ".into(),
        ));
    }

    let submission = submission.canonical();

    let txn = db.begin().await?;

    let prompt = catalog::find_prompt(&txn, &submission.prompt_id)
        .await?
        .ok_or_else(|| {
            AppError::UnknownReference(format!("Unknown prompt '{}'", submission.prompt_id))
        })?;

    for system_id in [&submission.system_id_a, &submission.system_id_b] {
        if catalog::find_output(&txn, &prompt.id, system_id)
            .await?
            .is_none()
        {
            return Err(AppError::UnknownReference(format!(
                "No output of system '{}' for prompt '{}'",
                system_id, prompt.id
            )));
        }
    }

    let task: Task = prompt.task.parse().map_err(|e| {
        AppError::Internal(format!("Prompt '{}' has an invalid task: {}", prompt.id, e))
    })?;

    let model = vote::Model {
        prompt_id: submission.prompt_id.clone(),
        system_id_a: submission.system_id_a.clone(),
        system_id_b: submission.system_id_b.clone(),
        session_id: session_id.to_string(),
        vote: submission.vote,
        date: Utc::now(),
        is_offensive_a: submission.is_offensive_a,
        is_offensive_b: submission.is_offensive_b,
    };

    match ledger::insert_vote(&txn, model).await {
        Ok(()) => {}
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!(prompt_id = %submission.prompt_id, "Duplicate vote rejected");
            return Err(AppError::DuplicateVote);
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) => {
            return Err(AppError::UnknownReference(
                "The voted outputs no longer exist".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    txn.commit().await?;

    info!(
        prompt_id = %submission.prompt_id,
        system_id_a = %submission.system_id_a,
        system_id_b = %submission.system_id_b,
        vote = %submission.vote,
        "Vote recorded"
    );

    ignored.insert(OutputKey::new(&submission.prompt_id, &submission.system_id_a));
    ignored.insert(OutputKey::new(&submission.prompt_id, &submission.system_id_b));

    let replacement =
        selection::select_battles(db, &task, session_id, &ignored, 1, randomize_sides).await?;

    Ok(replacement.into_iter().next())
}
