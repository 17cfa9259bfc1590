use thiserror::Error;

/// Errors that can occur during image store operations.
#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// The upload carried no filename.
    #[error("image filename is missing")]
    MissingFilename,
    /// The filename extension is not in the image allow-list.
    #[error("unsupported image format for '{0}'; use jpg, png, webp, gif, heic, or heif")]
    UnsupportedExtension(String),
    /// The relative path escapes the store root or is otherwise malformed.
    #[error("invalid image path: {0}")]
    InvalidPath(String),
    /// An I/O error occurred.
    #[error("image store IO error: {0}")]
    Io(#[from] std::io::Error),
}
