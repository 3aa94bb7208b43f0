//! Data layer
//!
//! Document-store adapter (SQLite via sqlx) and entity models.

mod models;
mod store;

pub use models::*;
pub use store::{IN_BATCH_SIZE, Store};
