use tracing::info;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::photos::dtos::is_listable_extension;
use crate::modules::storage::PhotoStore;
use crate::shared::validation::sanitize_filename;

/// Photo domain logic over the filesystem store
pub struct PhotoService {
    store: PhotoStore,
    /// Root-relative URL prefix clients fetch photos from
    public_prefix: String,
}

impl PhotoService {
    pub fn new(store: PhotoStore, public_prefix: impl Into<String>) -> Self {
        Self {
            store,
            public_prefix: public_prefix.into(),
        }
    }

    /// Root-relative URLs for every listable photo, in directory order.
    /// Files whose extension is outside the listable set stay invisible.
    pub async fn list_photos(&self) -> Result<Vec<String>> {
        let names = self.store.list().await?;

        Ok(names
            .into_iter()
            .filter(|name| is_listable_extension(name))
            .map(|name| format!("{}/{}", self.public_prefix, name))
            .collect())
    }

    /// Store an upload under a collision-resistant name.
    ///
    /// The original name is sanitized, then an 8-character random hex prefix
    /// keeps repeated uploads of the same file from overwriting each other.
    /// Returns the stored filename.
    pub async fn save_upload(&self, original_name: &str, data: &[u8]) -> Result<String> {
        let sanitized = sanitize_filename(original_name);
        let stored_name = format!("{}_{}", random_prefix(), sanitized);

        self.store.put(&stored_name, data).await?;
        info!("Photo stored: name={}, size={}", stored_name, data.len());

        Ok(stored_name)
    }
}

/// 8 hex characters. Collision avoidance, not access control.
fn random_prefix() -> String {
    hex::encode(&Uuid::new_v4().as_bytes()[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_service() -> PhotoService {
        let dir = std::env::temp_dir().join(format!("photowall-service-{}", Uuid::new_v4()));
        PhotoService::new(PhotoStore::new(dir), "/static/photos")
    }

    #[test]
    fn test_random_prefix_is_eight_hex_chars() {
        let prefix = random_prefix();
        assert_eq!(prefix.len(), 8);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_save_upload_prefixes_and_sanitizes() {
        let service = temp_service();

        let stored = service.save_upload("my photo.png", b"bytes").await.unwrap();
        assert_eq!(&stored[8..9], "_");
        assert!(stored.ends_with("my_photo.png"));
        assert!(stored[..8].chars().all(|c| c.is_ascii_hexdigit()));

        std::fs::remove_dir_all(service.store.base_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_same_name_twice_yields_distinct_stored_names() {
        let service = temp_service();

        let first = service.save_upload("photo.png", b"one").await.unwrap();
        let second = service.save_upload("photo.png", b"two").await.unwrap();
        assert_ne!(first, second);

        let listed = service.list_photos().await.unwrap();
        assert_eq!(listed.len(), 2);

        std::fs::remove_dir_all(service.store.base_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_list_hides_non_listable_extensions() {
        let service = temp_service();

        service.save_upload("vector.svg", b"<svg/>").await.unwrap();
        service.save_upload("raster.png", b"png").await.unwrap();

        let listed = service.list_photos().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].starts_with("/static/photos/"));
        assert!(listed[0].ends_with("raster.png"));

        std::fs::remove_dir_all(service.store.base_dir()).unwrap();
    }
}
