//! Vote export for the offline rating engine.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use common::{ScoringRecord, Task, VoteValue};
use sea_orm::{ConnectionTrait, DbErr};
use tracing::info;

use crate::entity::{output, vote};
use crate::{catalog, ledger};

/// Judge recorded on ties synthesized for identical outputs.
pub const PLACEHOLDER_JUDGE: &str = "<placeholder>";

/// Systems with fewer counted votes than this destabilize the ratings of
/// every other system, so their battles are left out.
pub const DEFAULT_MIN_VOTES: u64 = 20;

const PROLIFIC_PREFIX: &str = "prolific-id-";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub excluded_session_ids: Vec<String>,
    /// Keep only sessions of recruited participants.
    pub only_prolific: bool,
    pub min_votes: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            excluded_session_ids: vec![],
            only_prolific: false,
            min_votes: DEFAULT_MIN_VOTES,
        }
    }
}

/// Timestamp of synthesized ties.
fn placeholder_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Every pair of outputs on the same prompt with identical text, systems in
/// canonical order. These are never shown to annotators and count as ties.
pub fn same_text_ties(outputs: &[output::Model]) -> Vec<vote::Model> {
    let mut by_prompt: BTreeMap<&str, Vec<&output::Model>> = BTreeMap::new();
    for output in outputs {
        by_prompt
            .entry(output.prompt_id.as_str())
            .or_default()
            .push(output);
    }

    let mut ties = Vec::new();
    for (prompt_id, mut outputs) in by_prompt {
        outputs.sort_by(|a, b| a.system_id.cmp(&b.system_id));
        for (i, a) in outputs.iter().enumerate() {
            for b in &outputs[i + 1..] {
                if a.text == b.text {
                    ties.push(vote::Model {
                        prompt_id: prompt_id.to_string(),
                        system_id_a: a.system_id.clone(),
                        system_id_b: b.system_id.clone(),
                        session_id: PLACEHOLDER_JUDGE.to_string(),
                        vote: VoteValue::Tie,
                        date: placeholder_date(),
                        is_offensive_a: false,
                        is_offensive_b: false,
                    });
                }
            }
        }
    }
    ties
}

/// Turn counted votes and synthesized ties into export records, keeping only
/// battles whose two systems both reach `min_votes` (ties included).
pub fn assemble_records(
    votes: Vec<vote::Model>,
    ties: Vec<vote::Model>,
    mut votes_per_system: BTreeMap<String, u64>,
    min_votes: u64,
) -> Vec<ScoringRecord> {
    for tie in &ties {
        *votes_per_system.entry(tie.system_id_a.clone()).or_default() += 1;
        *votes_per_system.entry(tie.system_id_b.clone()).or_default() += 1;
    }

    let enough =
        |system_id: &str| votes_per_system.get(system_id).copied().unwrap_or(0) >= min_votes;

    votes
        .into_iter()
        .chain(ties)
        .filter(|v| enough(&v.system_id_a) && enough(&v.system_id_b))
        .filter_map(|v| {
            ScoringRecord::new(
                &v.prompt_id,
                &v.system_id_a,
                &v.system_id_b,
                v.vote,
                &v.session_id,
                v.date,
            )
        })
        .collect()
}

/// Build the rating engine input for one task.
pub async fn scoring_records<C: ConnectionTrait>(
    db: &C,
    task: &Task,
    options: &ExportOptions,
) -> Result<Vec<ScoringRecord>, DbErr> {
    let mut excluded: HashSet<String> = options.excluded_session_ids.iter().cloned().collect();
    if options.only_prolific {
        excluded.extend(
            ledger::session_ids_for_task(db, task)
                .await?
                .into_iter()
                .filter(|id| !id.starts_with(PROLIFIC_PREFIX)),
        );
    }
    let mut excluded: Vec<String> = excluded.into_iter().collect();
    excluded.sort();

    let (votes, per_system, outputs) = tokio::try_join!(
        ledger::votes_for_scoring(db, task, &excluded),
        ledger::votes_per_system(db, task, &excluded),
        catalog::outputs_for_task(db, task),
    )?;

    let ties = same_text_ties(&outputs);
    let vote_count = votes.len();
    let tie_count = ties.len();
    let records = assemble_records(votes, ties, per_system, options.min_votes);

    info!(
        %task,
        excluded_sessions = excluded.len(),
        votes = vote_count,
        synthesized_ties = tie_count,
        records = records.len(),
        "Prepared scoring records"
    );

    Ok(records)
}
