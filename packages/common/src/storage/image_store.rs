use std::path::{Component, Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tokio::fs;

use super::error::ImageStoreError;

/// Extensions accepted for uploaded images (compared case-insensitively).
const ALLOWED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "webp", "gif", "heic", "heif"];

/// What an uploaded image is used for. Becomes the filename prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageRole {
    /// A scanned notebook page.
    Notebook,
    /// A regular photo.
    Photo,
}

impl ImageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notebook => "notebook",
            Self::Photo => "photo",
        }
    }
}

/// Filesystem-backed store for uploaded entry images.
///
/// Files are laid out by the owning entry's date:
/// `{root}/YYYY/MM/DD/{role}-{random}{ext}`. The date directory reflects the
/// entry date at upload time; files are not moved when an entry's date is
/// edited later.
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Create an image store rooted at `root`, creating the directory if absent.
    pub async fn new(root: PathBuf) -> Result<Self, ImageStoreError> {
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate the original filename, store `data` under a date-derived
    /// directory with a collision-resistant generated name, and return the
    /// forward-slash relative path to persist.
    ///
    /// The write goes through a temp file in the target directory followed by
    /// a rename, so a failed write never leaves a partial file at the
    /// returned path.
    pub async fn save(
        &self,
        data: &[u8],
        original_filename: &str,
        entry_date: NaiveDate,
        role: ImageRole,
    ) -> Result<String, ImageStoreError> {
        let extension = validate_image_filename(original_filename)?;

        let relative_dir = format!(
            "{:04}/{:02}/{:02}",
            entry_date.year(),
            entry_date.month(),
            entry_date.day()
        );
        let filename = format!(
            "{}-{}.{}",
            role.as_str(),
            uuid::Uuid::new_v4().simple(),
            extension
        );

        let destination_dir = self.root.join(&relative_dir);
        fs::create_dir_all(&destination_dir).await?;

        let destination = destination_dir.join(&filename);
        let temp_path = destination_dir.join(format!(".tmp-{}", uuid::Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &destination).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(format!("{relative_dir}/{filename}"))
    }

    /// Remove the file at `relative_path` if it exists.
    ///
    /// Idempotent: an empty path or an already-removed file is not an error.
    pub async fn delete(&self, relative_path: &str) -> Result<(), ImageStoreError> {
        if relative_path.is_empty() {
            return Ok(());
        }
        let Some(absolute) = self.resolve(relative_path) else {
            return Err(ImageStoreError::InvalidPath(relative_path.to_string()));
        };

        match fs::metadata(&absolute).await {
            Ok(meta) if meta.is_file() => match fs::remove_file(&absolute).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute path for a stored relative path, or `None` if the path is
    /// empty, absolute, or contains traversal components.
    pub fn resolve(&self, relative_path: &str) -> Option<PathBuf> {
        if relative_path.is_empty() {
            return None;
        }
        let candidate = Path::new(relative_path);
        if !candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(candidate))
    }
}

/// Check the filename is present and carries an allowed image extension.
/// Returns the lower-cased extension.
fn validate_image_filename(original_filename: &str) -> Result<String, ImageStoreError> {
    let name = original_filename.trim();
    if name.is_empty() {
        return Err(ImageStoreError::MissingFilename);
    }
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| ImageStoreError::UnsupportedExtension(name.to_string()))?;
    Ok(extension)
}
