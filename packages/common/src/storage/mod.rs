mod error;

pub mod image_store;

pub use error::ImageStoreError;
pub use image_store::{ImageRole, ImageStore};
