use axum::Json;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::models::entry::{EntryFeedQuery, EntryListResponse, EntryResponse, Pagination};
use crate::repo;
use crate::state::AppState;

/// Entries shown per public feed page.
const FEED_PER_PAGE: u64 = 20;

#[utoipa::path(
    get,
    path = "/",
    tag = "Entries",
    operation_id = "listEntries",
    summary = "Browse the public feed",
    description = "Returns one page of fully assembled entries, newest entry date first. \
        Out-of-range page numbers clamp to the nearest valid page, reported in `pagination.page`.",
    params(EntryFeedQuery),
    responses(
        (status = 200, description = "One feed page", body = EntryListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<EntryFeedQuery>,
) -> Result<Json<EntryListResponse>, AppError> {
    let requested_page = query.page.unwrap_or(1).max(1);
    let page = repo::entry::list_page(&state.db, requested_page, FEED_PER_PAGE).await?;

    let entry_ids: Vec<i32> = page.entries.iter().map(|entry| entry.id).collect();
    let mut assets_by_entry = repo::asset::list_for_entries(&state.db, &entry_ids).await?;

    let data = page
        .entries
        .into_iter()
        .map(|entry| {
            let assets = assets_by_entry.remove(&entry.id).unwrap_or_default();
            EntryResponse::assemble(entry, assets)
        })
        .collect();

    Ok(Json(EntryListResponse {
        data,
        pagination: Pagination {
            page: page.page,
            per_page: FEED_PER_PAGE,
            total: page.total,
            total_pages: page.total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Entries",
    operation_id = "getEntry",
    summary = "Get one entry",
    params(("id" = i32, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry detail", body = EntryResponse),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EntryResponse>, AppError> {
    let entry = repo::entry::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {id} not found")))?;

    let assets = repo::asset::list_for_entry(&state.db, id).await?;
    Ok(Json(EntryResponse::assemble(entry, assets)))
}
