use std::collections::HashSet;

use axum::extract::Multipart;
use axum::extract::multipart::Field;

use crate::error::AppError;

/// A file field that carried a filename.
pub struct FileUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A new photo paired with its caption.
pub struct PhotoUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub caption: String,
}

/// Client instructions for a photo the entry already owns.
pub struct ExistingPhotoPatch {
    pub id: i32,
    pub caption: String,
}

/// The admin entry form, parsed from a multipart body. Create and update
/// share the field contract; the existing-photo fields simply stay empty on
/// create.
pub struct EntryForm {
    pub entry_date: Option<String>,
    pub title: String,
    pub body_markdown: String,
    pub notebook_caption: String,
    pub notebook: Option<FileUpload>,
    pub new_photos: Vec<PhotoUpload>,
    /// In client-submitted order; drives dense sort_index renumbering.
    pub existing_photos: Vec<ExistingPhotoPatch>,
    pub deleted_photo_ids: HashSet<i32>,
}

impl EntryForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut entry_date: Option<String> = None;
        let mut title = String::new();
        let mut body_markdown = String::new();
        let mut notebook_caption = String::new();
        let mut notebook: Option<FileUpload> = None;
        let mut photo_files: Vec<Option<FileUpload>> = Vec::new();
        let mut photo_captions: Vec<String> = Vec::new();
        let mut existing_ids: Vec<i32> = Vec::new();
        let mut existing_captions: Vec<String> = Vec::new();
        let mut deleted_photo_ids: HashSet<i32> = HashSet::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "entry_date" => entry_date = Some(read_text(field).await?),
                "title" => title = read_text(field).await?,
                "body_markdown" => body_markdown = read_text(field).await?,
                "notebook_caption" => notebook_caption = read_text(field).await?,
                "notebook_page" => {
                    if let Some(upload) = read_file(field).await? {
                        notebook = Some(upload);
                    }
                }
                "photos" | "new_photos" => photo_files.push(read_file(field).await?),
                "photo_caption" | "new_photo_caption" => {
                    photo_captions.push(read_text(field).await?)
                }
                "existing_photo_id" => existing_ids.push(read_id(field).await?),
                "existing_photo_caption" => existing_captions.push(read_text(field).await?),
                "existing_photo_delete" => {
                    deleted_photo_ids.insert(read_id(field).await?);
                }
                _ => {} // Ignore unknown fields.
            }
        }

        // Captions pair with files by field position. A file field without a
        // filename still consumes its caption slot before being dropped, and
        // a short caption list pads with empty strings rather than erroring.
        let new_photos = photo_files
            .into_iter()
            .enumerate()
            .filter_map(|(index, file)| {
                file.map(|file| PhotoUpload {
                    filename: file.filename,
                    bytes: file.bytes,
                    caption: photo_captions.get(index).cloned().unwrap_or_default(),
                })
            })
            .collect();

        let existing_photos = existing_ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| ExistingPhotoPatch {
                id,
                caption: existing_captions.get(index).cloned().unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            entry_date,
            title,
            body_markdown,
            notebook_caption,
            notebook,
            new_photos,
            existing_photos,
            deleted_photo_ids,
        })
    }
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))
}

/// Read a file field; `None` when the client submitted no file (empty
/// filename), which callers must skip rather than reject.
async fn read_file(field: Field<'_>) -> Result<Option<FileUpload>, AppError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
    if filename.is_empty() {
        return Ok(None);
    }
    Ok(Some(FileUpload {
        filename,
        bytes: bytes.to_vec(),
    }))
}

async fn read_id(field: Field<'_>) -> Result<i32, AppError> {
    let text = read_text(field).await?;
    text.trim()
        .parse::<i32>()
        .map_err(|_| AppError::Validation(format!("Invalid photo id '{}'", text.trim())))
}
