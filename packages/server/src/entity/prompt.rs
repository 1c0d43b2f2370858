use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A prompt the competing systems generated outputs for.
///
/// Exactly one content shape is set: a word pair, a news headline, or an
/// image url (optionally with free text).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prompts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub task: String,

    pub word1: Option<String>,
    pub word2: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub headline: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub prompt: Option<String>,

    #[sea_orm(has_many)]
    pub outputs: HasMany<super::output::Entity>,

    #[sea_orm(has_many)]
    pub votes: HasMany<super::vote::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
