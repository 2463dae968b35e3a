use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::photos::dtos::{is_upload_extension, UploadResponseDto};
use crate::features::photos::services::PhotoService;

/// List stored photos as root-relative URLs
pub async fn list_photos(State(service): State<Arc<PhotoService>>) -> Result<Json<Vec<String>>> {
    let photos = service.list_photos().await?;
    Ok(Json(photos))
}

/// Accept a single multipart `photo` field and store it.
///
/// Validation order mirrors the client contract: missing field, then empty
/// filename, then extension. Nothing is written before all checks pass.
pub async fn upload_photo(
    State(service): State<Arc<PhotoService>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponseDto>> {
    let mut file_name: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        match field.name().unwrap_or("") {
            "photo" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;
                data = Some(bytes.to_vec());
            }
            other => {
                debug!("Ignoring unknown field: {}", other);
            }
        }
    }

    let data = data.ok_or_else(|| AppError::BadRequest("No file part".to_string()))?;

    let file_name = file_name.unwrap_or_default();
    if file_name.is_empty() {
        return Err(AppError::BadRequest("No selected file".to_string()));
    }

    if !is_upload_extension(&file_name) {
        return Err(AppError::BadRequest("Invalid file type".to_string()));
    }

    let stored = service.save_upload(&file_name, &data).await?;

    Ok(Json(UploadResponseDto {
        success: true,
        filename: stored,
    }))
}

#[cfg(test)]
mod tests {
    use crate::features::photos::dtos::UploadResponseDto;
    use crate::shared::test_helpers::test_app;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::Value;

    fn allowed_client() -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("10.0.0.5"),
        )
    }

    fn photo_form(file_name: &str, bytes: &'static [u8]) -> MultipartForm {
        MultipartForm::new().add_part(
            "photo",
            Part::bytes(bytes).file_name(file_name.to_string()),
        )
    }

    #[tokio::test]
    async fn test_listing_is_empty_on_fresh_storage() {
        let (app, _ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        let (name, value) = allowed_client();
        let response = server.get("/photos").add_header(name, value).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Vec<String>>(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_upload_then_list_round_trip() {
        let (app, _ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        let (name, value) = allowed_client();
        let response = server
            .post("/upload")
            .multipart(photo_form("sunset.png", b"fake-png-bytes"))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let upload: UploadResponseDto = response.json();
        assert!(upload.success);
        assert!(upload.filename.ends_with("_sunset.png"));

        let (name, value) = allowed_client();
        let listed = server
            .get("/photos")
            .add_header(name, value)
            .await
            .json::<Vec<String>>();
        assert_eq!(listed, vec![format!("/static/photos/{}", upload.filename)]);
    }

    #[tokio::test]
    async fn test_uploading_same_name_twice_stores_two_photos() {
        let (app, _ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        let mut stored = Vec::new();
        for _ in 0..2 {
            let (name, value) = allowed_client();
            let response = server
                .post("/upload")
                .multipart(photo_form("photo.png", b"bytes"))
                .add_header(name, value)
                .await;
            stored.push(response.json::<UploadResponseDto>().filename);
        }
        assert_ne!(stored[0], stored[1]);

        let (name, value) = allowed_client();
        let listed = server
            .get("/photos")
            .add_header(name, value)
            .await
            .json::<Vec<String>>();
        assert_eq!(listed.len(), 2);
        for url in &listed {
            assert!(url.starts_with("/static/photos/"), "{url}");
        }
    }

    #[tokio::test]
    async fn test_invalid_file_type_is_rejected_and_not_stored() {
        let (app, ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        let (name, value) = allowed_client();
        let response = server
            .post("/upload")
            .multipart(photo_form("evil.exe", b"MZ"))
            .add_header(name, value)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid file type");

        let entries = std::fs::read_dir(ctx.photos_dir())
            .map(|dir| dir.count())
            .unwrap_or(0);
        assert_eq!(entries, 0, "rejected upload must not create a file");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_no_file_part() {
        let (app, _ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        let (name, value) = allowed_client();
        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_text("caption", "hello"))
            .add_header(name, value)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "No file part");
    }

    #[tokio::test]
    async fn test_empty_filename_is_no_selected_file() {
        let (app, _ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        let (name, value) = allowed_client();
        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new()
                    .add_part("photo", Part::bytes(&b"bytes"[..]).file_name(String::new())),
            )
            .add_header(name, value)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "No selected file");
    }

    #[tokio::test]
    async fn test_traversal_names_are_flattened() {
        let (app, ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        let (name, value) = allowed_client();
        let response = server
            .post("/upload")
            .multipart(photo_form("../../escape.png", b"bytes"))
            .add_header(name, value)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let upload: UploadResponseDto = response.json();
        assert!(!upload.filename.contains('/'));
        assert!(ctx.photos_dir().join(&upload.filename).exists());
    }

    #[tokio::test]
    async fn test_listed_urls_keep_the_static_prefix_and_extension_set() {
        let (app, _ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        for file_name in ["a.png", "b.JPG", "c.webp"] {
            let (name, value) = allowed_client();
            server
                .post("/upload")
                .multipart(photo_form(file_name, b"bytes"))
                .add_header(name, value)
                .await;
        }

        let (name, value) = allowed_client();
        let listed = server
            .get("/photos")
            .add_header(name, value)
            .await
            .json::<Vec<String>>();

        assert_eq!(listed.len(), 3);
        for url in listed {
            assert!(url.starts_with("/static/photos/"), "{url}");
            let lowered = url.to_ascii_lowercase();
            assert!(
                ["png", "jpg", "jpeg", "gif", "bmp", "webp"]
                    .iter()
                    .any(|ext| lowered.ends_with(&format!(".{ext}"))),
                "{url}"
            );
        }
    }
}
