use common::VoteValue;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One annotation: a session's judgement of two outputs of the same prompt.
///
/// Rows are stored in canonical order (`system_id_a < system_id_b`), so the
/// primary key also rejects the mirrored battle. The composite foreign keys
/// into `outputs` and the ordering check are created by
/// [`crate::seed::ensure_constraints`].
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub prompt_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub system_id_a: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub system_id_b: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: String,

    pub vote: VoteValue,
    pub date: DateTimeUtc,
    pub is_offensive_a: bool,
    pub is_offensive_b: bool,

    #[sea_orm(belongs_to, from = "prompt_id", to = "id")]
    pub prompt: HasOne<super::prompt::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
