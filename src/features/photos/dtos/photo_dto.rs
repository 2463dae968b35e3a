use serde::{Deserialize, Serialize};

/// Response body for a successful upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponseDto {
    pub success: bool,
    /// Stored filename, prefix included
    pub filename: String,
}

/// Extensions visible in photo listings
pub const LISTABLE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Extensions accepted on upload. Superset of the listable set: svg files are
/// stored but never listed.
pub const UPLOAD_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "svg"];

fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Check whether a filename may be accepted for upload (case-insensitive)
pub fn is_upload_extension(file_name: &str) -> bool {
    extension(file_name)
        .map(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check whether a stored filename shows up in listings (case-insensitive)
pub fn is_listable_extension(file_name: &str) -> bool {
    extension(file_name)
        .map(|ext| LISTABLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
