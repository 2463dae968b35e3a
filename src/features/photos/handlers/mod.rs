pub mod photo_handler;

pub use photo_handler::{list_photos, upload_photo};
