use std::collections::HashSet;

use common::{OutputKey, VoteValue};
use serde::Deserialize;

use crate::error::AppError;
use crate::recorder::VoteSubmission;

use super::shared::lenient_bool;

/// Form body of `POST /vote`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VoteForm {
    #[schema(example = "en_001")]
    pub prompt_id: String,
    #[schema(example = "team-a")]
    pub system_id_a: String,
    #[schema(example = "baseline")]
    pub system_id_b: String,
    /// `a`, `b`, `t` (tie) or `n` (skip).
    #[schema(example = "a")]
    pub vote: String,
    /// Outputs (`{prompt_id}-{system_id}`) the client already holds and must
    /// not be offered again.
    #[serde(default, alias = "ignored_output_ids[]", alias = "ignore_output_ids[]")]
    pub ignore_output_ids: Vec<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_offensive_a: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_offensive_b: bool,
    /// Anti-automation challenge response.
    #[serde(default)]
    pub turnstile_token: Option<String>,
}

impl VoteForm {
    /// Validate the form and split it into the judgement and the client's
    /// exclusion list.
    pub fn into_parts(self) -> Result<(VoteSubmission, HashSet<OutputKey>), AppError> {
        for (name, value) in [
            ("prompt_id", &self.prompt_id),
            ("system_id_a", &self.system_id_a),
            ("system_id_b", &self.system_id_b),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("`{name}` must not be empty")));
            }
        }

        let vote = self
            .vote
            .parse::<VoteValue>()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let ignored = self
            .ignore_output_ids
            .iter()
            .map(|id| id.parse::<OutputKey>())
            .collect::<Result<HashSet<_>, _>>()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok((
            VoteSubmission {
                prompt_id: self.prompt_id,
                system_id_a: self.system_id_a,
                system_id_b: self.system_id_b,
                vote,
                is_offensive_a: self.is_offensive_a,
                is_offensive_b: self.is_offensive_b,
            },
            ignored,
        ))
    }
}
