pub mod form;
mod write;

pub use form::EntryForm;
pub use write::{create_entry, delete_entry, update_entry};
