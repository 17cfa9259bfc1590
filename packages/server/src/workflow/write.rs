//! The entry write workflow: create, update, and delete span the relational
//! store and the image store as one logical transaction.
//!
//! Ordering guarantees: a file save happens before the row that references
//! it is written, and the relational commit happens before any compensating
//! or post-commit file deletion. A crash mid-attempt can therefore leave an
//! orphaned file, never a dangling row.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use common::{ImageRole, ImageStore};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};

use super::form::{EntryForm, PhotoUpload};
use crate::entity::asset::{self, AssetKind};
use crate::entity::entry;
use crate::error::AppError;
use crate::repo;

/// Create an entry with its optional notebook page and photos. Returns the
/// new entry's id.
///
/// On any failure the transaction is rolled back and every file saved during
/// this attempt is removed before the error is returned.
pub async fn create_entry(
    db: &DatabaseConnection,
    images: &ImageStore,
    form: EntryForm,
) -> Result<i32, AppError> {
    let entry_date = normalized_entry_date(form.entry_date.as_deref())?;
    let now = utc_now_second();

    let txn = db.begin().await?;
    let mut saved_files: Vec<String> = Vec::new();

    match write_new_entry(&txn, images, &mut saved_files, entry_date, now, &form).await {
        Ok(entry_id) => match txn.commit().await {
            Ok(()) => Ok(entry_id),
            Err(e) => {
                delete_files_best_effort(images, &saved_files).await;
                Err(e.into())
            }
        },
        Err(err) => {
            if let Err(e) = txn.rollback().await {
                tracing::error!("rollback failed after entry create error: {e}");
            }
            delete_files_best_effort(images, &saved_files).await;
            Err(err)
        }
    }
}

async fn write_new_entry(
    txn: &DatabaseTransaction,
    images: &ImageStore,
    saved_files: &mut Vec<String>,
    entry_date: NaiveDate,
    now: DateTime<Utc>,
    form: &EntryForm,
) -> Result<i32, AppError> {
    let new_entry = entry::ActiveModel {
        entry_date: Set(format_date(entry_date)),
        title: Set(form.title.trim().to_string()),
        body_markdown: Set(form.body_markdown.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_entry.insert(txn).await?;

    if let Some(upload) = &form.notebook {
        let file_path = images
            .save(&upload.bytes, &upload.filename, entry_date, ImageRole::Notebook)
            .await?;
        saved_files.push(file_path.clone());

        asset::ActiveModel {
            entry_id: Set(model.id),
            kind: Set(AssetKind::NotebookPage),
            file_path: Set(file_path),
            caption: Set(form.notebook_caption.trim().to_string()),
            sort_index: Set(0),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    store_new_photos(
        txn,
        images,
        saved_files,
        model.id,
        entry_date,
        &form.new_photos,
        0,
        now,
    )
    .await?;

    Ok(model.id)
}

/// Update an entry in place: entry fields, notebook replacement or caption,
/// existing-photo captions/order/deletions, then appended new photos.
///
/// Files belonging to replaced or deleted assets are only removed after the
/// commit succeeds; a rolled-back attempt removes only files saved during
/// the attempt itself.
pub async fn update_entry(
    db: &DatabaseConnection,
    images: &ImageStore,
    entry_id: i32,
    form: EntryForm,
) -> Result<(), AppError> {
    // Malformed dates abort before any transaction is opened.
    let entry_date = normalized_entry_date(form.entry_date.as_deref())?;

    let entry = repo::entry::find_by_id(db, entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {entry_id} not found")))?;

    let existing_notebook = repo::asset::find_notebook(db, entry_id).await?;
    let existing_photo_paths: HashMap<i32, String> = repo::asset::list_photos(db, entry_id)
        .await?
        .into_iter()
        .map(|photo| (photo.id, photo.file_path))
        .collect();

    let now = utc_now_second();
    let txn = db.begin().await?;
    let mut saved_files: Vec<String> = Vec::new();
    let mut remove_after_commit: Vec<String> = Vec::new();

    let result = apply_entry_update(
        &txn,
        images,
        &mut saved_files,
        &mut remove_after_commit,
        entry.id,
        entry_date,
        now,
        &form,
        existing_notebook.as_ref(),
        &existing_photo_paths,
    )
    .await;

    match result {
        Ok(()) => match txn.commit().await {
            Ok(()) => {
                // The new rows are durable; the superseded files can go.
                delete_files_best_effort(images, &remove_after_commit).await;
                Ok(())
            }
            Err(e) => {
                delete_files_best_effort(images, &saved_files).await;
                Err(e.into())
            }
        },
        Err(err) => {
            if let Err(e) = txn.rollback().await {
                tracing::error!("rollback failed after entry update error: {e}");
            }
            delete_files_best_effort(images, &saved_files).await;
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn apply_entry_update(
    txn: &DatabaseTransaction,
    images: &ImageStore,
    saved_files: &mut Vec<String>,
    remove_after_commit: &mut Vec<String>,
    entry_id: i32,
    entry_date: NaiveDate,
    now: DateTime<Utc>,
    form: &EntryForm,
    existing_notebook: Option<&asset::Model>,
    existing_photo_paths: &HashMap<i32, String>,
) -> Result<(), AppError> {
    entry::ActiveModel {
        id: Set(entry_id),
        entry_date: Set(format_date(entry_date)),
        title: Set(form.title.trim().to_string()),
        body_markdown: Set(form.body_markdown.trim().to_string()),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn)
    .await?;

    let notebook_caption = form.notebook_caption.trim().to_string();
    if let Some(upload) = &form.notebook {
        let new_path = images
            .save(&upload.bytes, &upload.filename, entry_date, ImageRole::Notebook)
            .await?;
        saved_files.push(new_path.clone());

        match existing_notebook {
            Some(existing) => {
                asset::ActiveModel {
                    id: Set(existing.id),
                    file_path: Set(new_path),
                    caption: Set(notebook_caption),
                    created_at: Set(now),
                    ..Default::default()
                }
                .update(txn)
                .await?;
                remove_after_commit.push(existing.file_path.clone());
            }
            None => {
                asset::ActiveModel {
                    entry_id: Set(entry_id),
                    kind: Set(AssetKind::NotebookPage),
                    file_path: Set(new_path),
                    caption: Set(notebook_caption),
                    sort_index: Set(0),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }
    } else if let Some(existing) = existing_notebook {
        asset::ActiveModel {
            id: Set(existing.id),
            caption: Set(notebook_caption),
            ..Default::default()
        }
        .update(txn)
        .await?;
    }

    // Surviving photos are renumbered densely in submission order; ids the
    // entry does not own are skipped.
    let mut sort_index = 0;
    for patch in &form.existing_photos {
        let Some(file_path) = existing_photo_paths.get(&patch.id) else {
            continue;
        };

        if form.deleted_photo_ids.contains(&patch.id) {
            asset::Entity::delete_many()
                .filter(asset::Column::Id.eq(patch.id))
                .filter(asset::Column::EntryId.eq(entry_id))
                .filter(asset::Column::Kind.eq(AssetKind::Photo))
                .exec(txn)
                .await?;
            remove_after_commit.push(file_path.clone());
            continue;
        }

        asset::ActiveModel {
            id: Set(patch.id),
            caption: Set(patch.caption.trim().to_string()),
            sort_index: Set(sort_index),
            ..Default::default()
        }
        .update(txn)
        .await?;
        sort_index += 1;
    }

    store_new_photos(
        txn,
        images,
        saved_files,
        entry_id,
        entry_date,
        &form.new_photos,
        sort_index,
        now,
    )
    .await?;

    Ok(())
}

/// Delete an entry, its asset rows, and, after commit, its files.
pub async fn delete_entry(
    db: &DatabaseConnection,
    images: &ImageStore,
    entry_id: i32,
) -> Result<(), AppError> {
    let entry = repo::entry::find_by_id(db, entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {entry_id} not found")))?;

    let file_paths = repo::asset::file_paths_for_entry(db, entry_id).await?;

    let txn = db.begin().await?;
    asset::Entity::delete_many()
        .filter(asset::Column::EntryId.eq(entry_id))
        .exec(&txn)
        .await?;
    entry::Entity::delete_by_id(entry.id).exec(&txn).await?;
    txn.commit().await?;

    delete_files_best_effort(images, &file_paths).await;
    Ok(())
}

/// Save each photo upload and insert its row, assigning dense sort_index
/// values from `starting_sort_index`. Returns the next free index.
#[allow(clippy::too_many_arguments)]
async fn store_new_photos(
    txn: &DatabaseTransaction,
    images: &ImageStore,
    saved_files: &mut Vec<String>,
    entry_id: i32,
    entry_date: NaiveDate,
    photos: &[PhotoUpload],
    starting_sort_index: i32,
    now: DateTime<Utc>,
) -> Result<i32, AppError> {
    let mut sort_index = starting_sort_index;
    for photo in photos {
        let file_path = images
            .save(&photo.bytes, &photo.filename, entry_date, ImageRole::Photo)
            .await?;
        saved_files.push(file_path.clone());

        asset::ActiveModel {
            entry_id: Set(entry_id),
            kind: Set(AssetKind::Photo),
            file_path: Set(file_path),
            caption: Set(photo.caption.trim().to_string()),
            sort_index: Set(sort_index),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        sort_index += 1;
    }
    Ok(sort_index)
}

/// Post-commit and rollback cleanup. Row state is already authoritative at
/// this point, so deletion failures are logged and swallowed.
async fn delete_files_best_effort(images: &ImageStore, paths: &[String]) {
    for path in paths {
        if let Err(e) = images.delete(path).await {
            tracing::warn!("failed to remove image file '{path}': {e}");
        }
    }
}

/// Absent dates default to today (UTC); present dates must parse as strict
/// `YYYY-MM-DD`.
fn normalized_entry_date(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Utc::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::Validation("Entry date must be in YYYY-MM-DD format".into())),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Timestamps are stored at second precision.
fn utc_now_second() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(0).unwrap_or(now)
}
