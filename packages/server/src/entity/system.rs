use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A competing generator. The baseline is a system like any other.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "systems")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(has_many)]
    pub outputs: HasMany<super::output::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
