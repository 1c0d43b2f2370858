use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Overview of the vote ledger.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    /// All votes, skips included.
    #[schema(example = 1200)]
    pub votes: u64,
    /// Sessions with at least one vote.
    #[schema(example = 85)]
    pub sessions: u64,
    #[schema(example = 1100)]
    pub votes_without_skips: u64,
    /// Sessions with at least one non-skip vote.
    #[schema(example = 80)]
    pub sessions_without_skips: u64,
    /// `[votes on a prompt, prompts with that many votes]`, ascending.
    #[schema(value_type = Vec<Vec<u64>>, example = json!([[0, 12], [1, 30], [2, 7]]))]
    pub histogram: Vec<[u64; 2]>,
    /// Votes per value (`a`, `b`, `t`, `n`).
    pub votes_per_category: BTreeMap<String, u64>,
}

/// Query parameters for `GET /systems/vote-counts`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SystemVoteCountsQuery {
    #[param(example = "a-en")]
    pub task: String,
}
