//! File upload endpoints

use axum::{extract::State, Json};
use axum_extra::extract::{multipart::Field, Multipart};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    services::storage::{UploadKind, UploadedFile},
};

use super::AuthenticatedUser;

/// Multipart form of the book photo upload
#[derive(ToSchema)]
pub struct BookPhotoUpload {
    #[schema(value_type = String, format = Binary)]
    pub photo: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    /// Stored filename, to be sent back as `photoFilename`
    pub filename: String,
}

pub(crate) fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {}", e))
}

/// Buffer a multipart file part
pub(crate) async fn read_file(field: Field) -> AppResult<UploadedFile> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let data = field.bytes().await.map_err(multipart_error)?;

    Ok(UploadedFile {
        file_name,
        content_type,
        data: data.to_vec(),
    })
}

/// Upload a book photo
#[utoipa::path(
    post,
    path = "/files/upload/book-photo",
    tag = "files",
    security(("bearer_auth" = [])),
    request_body(content_type = "multipart/form-data", content = BookPhotoUpload),
    responses(
        (status = 200, description = "Photo stored", body = UploadResponse),
        (status = 400, description = "Missing, empty or non-image file", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn upload_book_photo(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("photo") {
            continue;
        }
        let file = read_file(field).await?;
        let filename = state
            .services
            .storage
            .store(UploadKind::BookPhoto, Some(claims.user_id), &file)
            .await?;
        tracing::debug!("User {} uploaded book photo {}", claims.user_id, filename);
        return Ok(Json(UploadResponse { filename }));
    }

    Err(AppError::BadRequest("Please select a file to upload".to_string()))
}
