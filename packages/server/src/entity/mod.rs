pub mod asset;
pub mod entry;
