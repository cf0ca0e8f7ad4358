//! Persistence for the classroom content model

pub mod migrations;
pub mod sql_store;

pub use sql_store::{AttachmentRecord, ContentSqlStore};
