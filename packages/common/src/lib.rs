pub mod storage;

pub use storage::{ImageRole, ImageStore, ImageStoreError};
