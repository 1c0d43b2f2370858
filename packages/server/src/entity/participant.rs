use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A recruited (Prolific) annotator's study progress, keyed by session.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: String,

    pub consent_date: Option<DateTimeUtc>,
    pub finish_date: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
