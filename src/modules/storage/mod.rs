//! Storage module for photo files
//!
//! The filesystem is the database: a photo exists exactly when its file
//! exists under the photos directory.

mod photo_store;

pub use photo_store::PhotoStore;
