use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::asset::{self, AssetKind};
use crate::entity::entry;
use crate::repo::entry::DashboardRow;
use crate::utils::markdown::render_markdown;

pub use super::shared::Pagination;

/// Public URL at which a stored asset file is served.
pub fn media_url(file_path: &str) -> String {
    format!("/media/{file_path}")
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssetResponse {
    pub id: i32,
    pub kind: AssetKind,
    /// URL of the stored image, e.g. `/media/2024/03/05/photo-abc123.jpg`.
    pub url: String,
    pub caption: String,
    pub sort_index: i32,
    pub created_at: DateTime<Utc>,
}

impl From<asset::Model> for AssetResponse {
    fn from(model: asset::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            url: media_url(&model.file_path),
            caption: model.caption,
            sort_index: model.sort_index,
            created_at: model.created_at,
        }
    }
}

/// A fully assembled entry: row fields, rendered body, and display-ordered
/// assets partitioned into the optional notebook page and the photo list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryResponse {
    pub id: i32,
    /// ISO `YYYY-MM-DD`.
    #[schema(example = "2024-03-05")]
    pub entry_date: String,
    pub title: String,
    pub body_markdown: String,
    /// Body rendered to HTML (markdown source is escaped before rendering).
    pub body_html: String,
    pub notebook: Option<AssetResponse>,
    pub photos: Vec<AssetResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntryResponse {
    /// Assemble from an entry row and its display-ordered assets.
    pub fn assemble(entry: entry::Model, assets: Vec<asset::Model>) -> Self {
        let mut notebook = None;
        let mut photos = Vec::new();
        for asset in assets {
            match asset.kind {
                AssetKind::NotebookPage => notebook = Some(AssetResponse::from(asset)),
                AssetKind::Photo => photos.push(AssetResponse::from(asset)),
            }
        }

        let body_html = render_markdown(&entry.body_markdown);
        Self {
            id: entry.id,
            entry_date: entry.entry_date,
            title: entry.title,
            body_markdown: entry.body_markdown,
            body_html,
            notebook,
            photos,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryListResponse {
    pub data: Vec<EntryResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct EntryFeedQuery {
    /// Requested page (1-based; defaults to 1, clamps into range).
    pub page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreatedResponse {
    pub id: i32,
}

/// One admin-dashboard row.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardItem {
    pub id: i32,
    pub entry_date: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub photo_count: i64,
    pub has_notebook: bool,
}

impl From<DashboardRow> for DashboardItem {
    fn from(row: DashboardRow) -> Self {
        Self {
            id: row.id,
            entry_date: row.entry_date,
            title: row.title,
            updated_at: row.updated_at,
            photo_count: row.photo_count,
            has_notebook: row.has_notebook != 0,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardListResponse {
    pub data: Vec<DashboardItem>,
    pub total: u64,
}
