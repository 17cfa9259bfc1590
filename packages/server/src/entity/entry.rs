use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// ISO `YYYY-MM-DD`. Primary sort key for the public feed (descending,
    /// id descending as tie-break); not unique.
    pub entry_date: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body_markdown: String,

    #[sea_orm(has_many)]
    pub assets: HasMany<super::asset::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
