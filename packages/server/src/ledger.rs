//! Vote Ledger: the append-only record of every vote and the aggregates
//! derived from it.
//!
//! Coverage counts are always recomputed from the rows, never cached, so
//! concurrent voting cannot make them drift.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use common::{OutputKey, Task, VoteValue};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Func;
use sea_orm::*;

use crate::catalog::{self, prompt_ids_in_task};
use crate::entity::{prompt, vote};

/// Votes that express a preference or a tie.
fn counted_votes() -> Condition {
    Condition::all().add(
        vote::Column::Vote.is_in(VoteValue::ALL.iter().copied().filter(VoteValue::is_counted)),
    )
}

/// Non-skip votes of `task`.
fn counted_in_task(task: &Task) -> Condition {
    counted_votes()
        .add(vote::Column::PromptId.in_subquery(prompt_ids_in_task(task)))
}

/// `SELECT <column>, COUNT(*) FROM votes WHERE <condition> GROUP BY <column>`.
async fn count_grouped_by<C: ConnectionTrait>(
    db: &C,
    column: vote::Column,
    condition: Condition,
) -> Result<Vec<(String, i64)>, DbErr> {
    vote::Entity::find()
        .select_only()
        .column(column)
        .column_as(Expr::expr(Func::count(Expr::col(column))), "count")
        .filter(condition)
        .group_by(column)
        .into_tuple::<(String, i64)>()
        .all(db)
        .await
}

/// Non-skip votes per system in `task`, counting both sides of each vote.
/// Systems without votes are absent.
pub async fn system_vote_counts<C: ConnectionTrait>(
    db: &C,
    task: &Task,
) -> Result<HashMap<String, u64>, DbErr> {
    system_vote_counts_excluding(db, task, &[]).await
}

async fn system_vote_counts_excluding<C: ConnectionTrait>(
    db: &C,
    task: &Task,
    excluded_session_ids: &[String],
) -> Result<HashMap<String, u64>, DbErr> {
    let condition = || {
        let mut condition = counted_in_task(task);
        if !excluded_session_ids.is_empty() {
            condition = condition.add(
                vote::Column::SessionId.is_not_in(excluded_session_ids.iter().map(String::as_str)),
            );
        }
        condition
    };

    let (as_a, as_b) = tokio::try_join!(
        count_grouped_by(db, vote::Column::SystemIdA, condition()),
        count_grouped_by(db, vote::Column::SystemIdB, condition()),
    )?;

    let mut counts: HashMap<String, u64> = HashMap::new();
    for (system_id, count) in as_a.into_iter().chain(as_b) {
        *counts.entry(system_id).or_default() += count as u64;
    }
    Ok(counts)
}

/// Non-skip votes per prompt in `task`. Prompts without votes are absent.
pub async fn prompt_vote_counts<C: ConnectionTrait>(
    db: &C,
    task: &Task,
) -> Result<HashMap<String, u64>, DbErr> {
    Ok(
        count_grouped_by(db, vote::Column::PromptId, counted_in_task(task))
            .await?
            .into_iter()
            .map(|(prompt_id, count)| (prompt_id, count as u64))
            .collect(),
    )
}

/// Every output the session has voted on in `task`, on either side and
/// including skips.
pub async fn session_voted_outputs<C: ConnectionTrait>(
    db: &C,
    task: &Task,
    session_id: &str,
) -> Result<HashSet<OutputKey>, DbErr> {
    let rows = vote::Entity::find()
        .select_only()
        .column(vote::Column::PromptId)
        .column(vote::Column::SystemIdA)
        .column(vote::Column::SystemIdB)
        .filter(vote::Column::SessionId.eq(session_id))
        .filter(vote::Column::PromptId.in_subquery(prompt_ids_in_task(task)))
        .into_tuple::<(String, String, String)>()
        .all(db)
        .await?;

    let mut outputs = HashSet::with_capacity(rows.len() * 2);
    for (prompt_id, system_id_a, system_id_b) in rows {
        outputs.insert(OutputKey::new(prompt_id.clone(), system_id_a));
        outputs.insert(OutputKey::new(prompt_id, system_id_b));
    }
    Ok(outputs)
}

/// Append a vote. Duplicate keys surface as a unique-constraint violation.
pub async fn insert_vote<C: ConnectionTrait>(db: &C, model: vote::Model) -> Result<(), DbErr> {
    vote::Entity::insert(model.into_active_model())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Non-skip votes cast by a session across all tasks.
pub async fn session_vote_count<C: ConnectionTrait>(
    db: &C,
    session_id: &str,
) -> Result<u64, DbErr> {
    vote::Entity::find()
        .filter(vote::Column::SessionId.eq(session_id))
        .filter(counted_votes())
        .count(db)
        .await
}

fn without_skips_filter(without_skips: bool) -> Condition {
    let condition = Condition::all();
    if without_skips {
        condition.add(counted_votes())
    } else {
        condition
    }
}

pub async fn vote_count<C: ConnectionTrait>(db: &C, without_skips: bool) -> Result<u64, DbErr> {
    vote::Entity::find()
        .filter(without_skips_filter(without_skips))
        .count(db)
        .await
}

/// Distinct sessions that cast at least one (optionally non-skip) vote.
pub async fn session_count<C: ConnectionTrait>(db: &C, without_skips: bool) -> Result<u64, DbErr> {
    vote::Entity::find()
        .select_only()
        .column(vote::Column::SessionId)
        .filter(without_skips_filter(without_skips))
        .distinct()
        .count(db)
        .await
}

/// Non-skip votes per session across all tasks.
pub async fn votes_per_session<C: ConnectionTrait>(db: &C) -> Result<BTreeMap<String, u64>, DbErr> {
    Ok(count_grouped_by(
        db,
        vote::Column::SessionId,
        without_skips_filter(true),
    )
    .await?
    .into_iter()
    .map(|(session_id, count)| (session_id, count as u64))
    .collect())
}

/// Votes per vote value, every value present.
pub async fn votes_per_category<C: ConnectionTrait>(
    db: &C,
) -> Result<BTreeMap<String, u64>, DbErr> {
    let mut counts: BTreeMap<String, u64> = VoteValue::ALL
        .iter()
        .map(|v| (v.as_str().to_string(), 0))
        .collect();

    for (value, count) in count_grouped_by(db, vote::Column::Vote, Condition::all()).await? {
        counts.insert(value, count as u64);
    }
    Ok(counts)
}

/// Histogram over all prompts: votes on a prompt (skips included) to how
/// many prompts received that many votes.
pub async fn prompt_vote_histogram<C: ConnectionTrait>(
    db: &C,
) -> Result<BTreeMap<u64, u64>, DbErr> {
    let (prompt_ids, per_prompt) = tokio::try_join!(
        prompt::Entity::find()
            .select_only()
            .column(prompt::Column::Id)
            .into_tuple::<String>()
            .all(db),
        count_grouped_by(db, vote::Column::PromptId, Condition::all()),
    )?;

    let per_prompt: HashMap<String, i64> = per_prompt.into_iter().collect();

    let mut histogram = BTreeMap::new();
    for prompt_id in prompt_ids {
        let votes = per_prompt.get(&prompt_id).copied().unwrap_or(0) as u64;
        *histogram.entry(votes).or_default() += 1;
    }
    Ok(histogram)
}

/// Sessions that voted in `task`.
pub async fn session_ids_for_task<C: ConnectionTrait>(
    db: &C,
    task: &Task,
) -> Result<Vec<String>, DbErr> {
    vote::Entity::find()
        .select_only()
        .column(vote::Column::SessionId)
        .filter(vote::Column::PromptId.in_subquery(prompt_ids_in_task(task)))
        .group_by(vote::Column::SessionId)
        .order_by_asc(vote::Column::SessionId)
        .into_tuple::<String>()
        .all(db)
        .await
}

/// Non-skip votes per system of `task`, ignoring excluded sessions. Every
/// system with an output in the task is present, with zero if unvoted.
pub async fn votes_per_system<C: ConnectionTrait>(
    db: &C,
    task: &Task,
    excluded_session_ids: &[String],
) -> Result<BTreeMap<String, u64>, DbErr> {
    let (counts, system_ids) = tokio::try_join!(
        system_vote_counts_excluding(db, task, excluded_session_ids),
        catalog::system_ids_for_task(db, task),
    )?;

    let mut per_system: BTreeMap<String, u64> = counts.into_iter().collect();
    for system_id in system_ids {
        per_system.entry(system_id).or_insert(0);
    }
    Ok(per_system)
}

/// Rows the rating engine may consume for `task`: non-skip votes not cast
/// by an excluded session, oldest first.
pub async fn votes_for_scoring<C: ConnectionTrait>(
    db: &C,
    task: &Task,
    excluded_session_ids: &[String],
) -> Result<Vec<vote::Model>, DbErr> {
    let mut select = vote::Entity::find().filter(counted_in_task(task));
    if !excluded_session_ids.is_empty() {
        select = select.filter(
            vote::Column::SessionId.is_not_in(excluded_session_ids.iter().map(String::as_str)),
        );
    }

    select
        .order_by_asc(vote::Column::Date)
        .order_by_asc(vote::Column::SessionId)
        .all(db)
        .await
}

/// One vote with its prompt and both outputs, as dumped by `GET /votes.csv`.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, serde::Serialize)]
pub struct VoteDumpRow {
    pub session_id: String,
    pub date: DateTime<Utc>,
    pub prompt_id: String,
    pub task: String,
    pub word1: Option<String>,
    pub word2: Option<String>,
    pub headline: Option<String>,
    pub url: Option<String>,
    pub prompt: Option<String>,
    pub system_id_a: String,
    pub output_a: String,
    pub system_id_b: String,
    pub output_b: String,
    pub vote: VoteValue,
    pub is_offensive_a: bool,
    pub is_offensive_b: bool,
}

impl VoteDumpRow {
    /// Column names, in field order.
    pub const COLUMNS: [&'static str; 16] = [
        "session_id",
        "date",
        "prompt_id",
        "task",
        "word1",
        "word2",
        "headline",
        "url",
        "prompt",
        "system_id_a",
        "output_a",
        "system_id_b",
        "output_b",
        "vote",
        "is_offensive_a",
        "is_offensive_b",
    ];
}

const VOTE_DUMP_SQL: &str = r#"
SELECT v.session_id, v.date, v.prompt_id, p.task,
       p.word1, p.word2, p.headline, p.url, p.prompt,
       v.system_id_a, o_a.text AS output_a,
       v.system_id_b, o_b.text AS output_b,
       v.vote, v.is_offensive_a, v.is_offensive_b
FROM votes v
JOIN prompts p ON p.id = v.prompt_id
JOIN outputs o_a ON o_a.prompt_id = v.prompt_id AND o_a.system_id = v.system_id_a
JOIN outputs o_b ON o_b.prompt_id = v.prompt_id AND o_b.system_id = v.system_id_b
ORDER BY v.session_id, v.date
"#;

/// Every vote, skips included, joined with its prompt and output texts.
/// Ordered by session, then by date.
pub async fn vote_dump<C: ConnectionTrait>(db: &C) -> Result<Vec<VoteDumpRow>, DbErr> {
    VoteDumpRow::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        VOTE_DUMP_SQL,
    ))
    .all(db)
    .await
}

/// Render dump rows as CSV with a header line, also when `rows` is empty.
pub fn write_vote_dump_csv(rows: &[VoteDumpRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(VoteDumpRow::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}
