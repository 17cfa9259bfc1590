use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::config::AppConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthAdmin;
use crate::models::entry::{CreatedResponse, DashboardListResponse, EntryResponse};
use crate::repo;
use crate::state::AppState;
use crate::workflow::{self, EntryForm};

pub fn entry_upload_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.storage.max_upload_mb * 1024 * 1024)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Admin",
    operation_id = "listDashboard",
    summary = "List all entries with asset summaries",
    description = "One row per entry with its photo count and whether a notebook page exists, \
        computed in a single aggregate query.",
    responses(
        (status = 200, description = "Dashboard rows", body = DashboardListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn list_dashboard(
    _auth: AuthAdmin,
    State(state): State<AppState>,
) -> Result<Json<DashboardListResponse>, AppError> {
    let rows = repo::entry::list_dashboard_rows(&state.db).await?;
    let total = rows.len() as u64;
    let data = rows.into_iter().map(Into::into).collect();
    Ok(Json(DashboardListResponse { data, total }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Admin",
    operation_id = "createEntry",
    summary = "Publish a new entry",
    description = "Multipart form: `entry_date` (optional, defaults to today), `title`, \
        `body_markdown`, `notebook_caption`, `notebook_page` (file), repeated `photos` files \
        with parallel `photo_caption` fields. Saved images and database rows commit or are \
        cleaned up together.",
    request_body(content_type = "multipart/form-data", description = "Entry form with images"),
    responses(
        (status = 201, description = "Entry published", body = CreatedResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, multipart))]
pub async fn create_entry(
    _auth: AuthAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = EntryForm::from_multipart(multipart).await?;
    let entry_id = workflow::create_entry(&state.db, &state.images, form).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: entry_id })))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Admin",
    operation_id = "updateEntry",
    summary = "Edit an entry",
    description = "Multipart form as for create, plus ordered `existing_photo_id` / \
        `existing_photo_caption` fields and `existing_photo_delete` ids. Surviving photos are \
        renumbered densely in submission order; replaced or deleted files are removed only \
        after the database commit.",
    params(("id" = i32, Path, description = "Entry ID")),
    request_body(content_type = "multipart/form-data", description = "Entry form with images"),
    responses(
        (status = 200, description = "Updated entry", body = EntryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, multipart))]
pub async fn update_entry(
    _auth: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<EntryResponse>, AppError> {
    let form = EntryForm::from_multipart(multipart).await?;
    workflow::update_entry(&state.db, &state.images, id, form).await?;

    let entry = repo::entry::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Entry {id} missing after update")))?;
    let assets = repo::asset::list_for_entry(&state.db, id).await?;
    Ok(Json(EntryResponse::assemble(entry, assets)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Admin",
    operation_id = "deleteEntry",
    summary = "Delete an entry",
    description = "Removes the entry and its asset rows in one transaction, then removes the \
        stored image files.",
    params(("id" = i32, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn delete_entry(
    _auth: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    workflow::delete_entry(&state.db, &state.images, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
