//! Export format consumed by the offline rating engine.
//!
//! One record per counted vote, in the pairwise-battle layout used by
//! arena-style Elo/Bradley-Terry tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::vote_value::VoteValue;

/// Winner of a battle from the rating engine's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    ModelA,
    ModelB,
    Tie,
}

impl Winner {
    /// Skips carry no comparison and have no winner.
    pub fn from_vote(vote: VoteValue) -> Option<Self> {
        match vote {
            VoteValue::A => Some(Self::ModelA),
            VoteValue::B => Some(Self::ModelB),
            VoteValue::Tie => Some(Self::Tie),
            VoteValue::Skip => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringRecord {
    pub question_id: String,
    pub model_a: String,
    pub model_b: String,
    pub winner: Winner,
    pub judge: String,
    pub conversation_a: String,
    pub conversation_b: String,
    pub turn: u32,
    pub anony: bool,
    pub language: String,
    pub tstamp: i64,
}

impl ScoringRecord {
    /// Returns `None` for skip votes.
    pub fn new(
        prompt_id: &str,
        system_id_a: &str,
        system_id_b: &str,
        vote: VoteValue,
        session_id: &str,
        date: DateTime<Utc>,
    ) -> Option<Self> {
        Some(Self {
            question_id: prompt_id.to_string(),
            model_a: system_id_a.to_string(),
            model_b: system_id_b.to_string(),
            winner: Winner::from_vote(vote)?,
            judge: session_id.to_string(),
            conversation_a: String::new(),
            conversation_b: String::new(),
            turn: 0,
            anony: true,
            language: Language::from_prompt_id(prompt_id)
                .display_name()
                .to_string(),
            tstamp: date.timestamp(),
        })
    }
}
