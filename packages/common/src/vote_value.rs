#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a single pairwise comparison.
///
/// Serialized (and stored) as the single-letter codes the annotation client
/// submits. When the `sea-orm` feature is enabled, this enum can be used
/// directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")
)]
pub enum VoteValue {
    /// The left output (A) is better.
    #[serde(rename = "a")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "a"))]
    A,
    /// The right output (B) is better.
    #[serde(rename = "b")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "b"))]
    B,
    /// Both outputs are equally good (or bad).
    #[serde(rename = "t")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "t"))]
    Tie,
    /// The annotator skipped the battle.
    #[serde(rename = "n")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "n"))]
    Skip,
}

impl VoteValue {
    /// All possible vote values.
    pub const ALL: &'static [VoteValue] = &[Self::A, Self::B, Self::Tie, Self::Skip];

    /// Returns true if the vote expresses a preference or a tie, i.e. it counts
    /// towards coverage and ratings.
    pub fn is_counted(&self) -> bool {
        !matches!(self, Self::Skip)
    }

    /// The same judgement expressed with the two sides swapped.
    pub fn mirrored(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            other => other,
        }
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::Tie => "t",
            Self::Skip => "n",
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid vote string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid vote '{invalid}'. Valid values: a, b, t, n")]
pub struct ParseVoteError {
    invalid: String,
}

impl FromStr for VoteValue {
    type Err = ParseVoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "t" => Ok(Self::Tie),
            "n" => Ok(Self::Skip),
            _ => Err(ParseVoteError {
                invalid: s.to_string(),
            }),
        }
    }
}
