/// Profile image upload
///
/// # Endpoint
///
/// - `POST /api/auth/upload-image` - multipart/form-data, field `image`
///
/// Only jpg/jpeg/png are accepted, checked by both file extension and MIME
/// type. The stored file gets a generated name and is served back at
/// `/uploads/<name>`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::Multipart, extract::State, Extension, Json};
use serde::Serialize;
use taskflow_shared::auth::middleware::AuthContext;
use uuid::Uuid;

/// Extensions accepted for profile images
const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// MIME types accepted for profile images
const ALLOWED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    /// URL the stored image is served at
    pub image_url: String,
}

/// Accepts a profile image and returns its URL
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadImageResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let content_type = field.content_type().unwrap_or_default().to_string();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str())
            || !ALLOWED_MIME_TYPES.contains(&content_type.as_str())
        {
            return Err(ApiError::BadRequest(
                "Images only (jpg, jpeg, png)".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let stored_name = format!("image-{}.{}", Uuid::new_v4(), extension);
        let dir = &state.config.uploads.dir;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to create upload dir: {}", e)))?;
        tokio::fs::write(dir.join(&stored_name), &data)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to store upload: {}", e)))?;

        return Ok(Json(UploadImageResponse {
            image_url: format!("/uploads/{}", stored_name),
        }));
    }

    Err(ApiError::BadRequest("No image file provided".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_image_types() {
        assert!(ALLOWED_EXTENSIONS.contains(&"jpg"));
        assert!(ALLOWED_EXTENSIONS.contains(&"jpeg"));
        assert!(ALLOWED_EXTENSIONS.contains(&"png"));
        assert!(!ALLOWED_EXTENSIONS.contains(&"gif"));

        assert!(ALLOWED_MIME_TYPES.contains(&"image/png"));
        assert!(!ALLOWED_MIME_TYPES.contains(&"image/gif"));
    }
}
