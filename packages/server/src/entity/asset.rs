use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};

/// What an asset row holds: the entry's single notebook-page scan, or one of
/// its photos. At most one `NotebookPage` asset may exist per entry.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    DeriveActiveEnum,
    EnumIter,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    #[sea_orm(string_value = "notebook_page")]
    NotebookPage,
    #[sea_orm(string_value = "photo")]
    Photo,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub entry_id: i32,
    #[sea_orm(belongs_to, from = "entry_id", to = "id")]
    pub entry: HasOne<super::entry::Entity>,

    pub kind: AssetKind,

    /// Posix relative path under the image store root, of the form
    /// `YYYY/MM/DD/<role>-<token><ext>`. The directory reflects the entry
    /// date at upload time.
    pub file_path: String,
    pub caption: String,

    /// Display order among the entry's photos, kept dense (0, 1, 2, ...).
    /// The notebook page always sorts first regardless of this value.
    pub sort_index: i32,

    /// Set on row creation; refreshed when a notebook page's underlying
    /// file is replaced.
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
