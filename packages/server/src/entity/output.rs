use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What one system generated for one prompt.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outputs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub prompt_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub system_id: String,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    #[sea_orm(belongs_to, from = "prompt_id", to = "id")]
    pub prompt: HasOne<super::prompt::Entity>,
    #[sea_orm(belongs_to, from = "system_id", to = "id")]
    pub system: HasOne<super::system::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
