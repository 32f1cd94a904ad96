//! Local filesystem storage for uploaded images

use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    ProfilePicture,
    BookPhoto,
}

impl UploadKind {
    /// Path segment under `/uploads` the files are served from
    pub fn route_segment(&self) -> &'static str {
        match self {
            UploadKind::ProfilePicture => "profile-pics",
            UploadKind::BookPhoto => "book-pics",
        }
    }
}

/// An uploaded multipart file, fully buffered
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Keep the last path component and replace anything outside `[A-Za-z0-9._-]`
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

/// Stored extension for each accepted image format
fn image_extension(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::WebP => Some("webp"),
        _ => None,
    }
}

/// Detect the image format from the content, not from what the client claims
fn detect_image_extension(file: &UploadedFile) -> Option<&'static str> {
    let declared_image = file
        .content_type
        .as_deref()
        .map(|ct| ct.starts_with("image/"))
        .unwrap_or(false);
    if !declared_image {
        return None;
    }
    image::guess_format(&file.data).ok().and_then(image_extension)
}

/// Sanitized client filename without its extension
fn file_stem(file: &UploadedFile) -> String {
    let sanitized = file.file_name.as_deref().map(sanitize_filename).unwrap_or_default();
    let stem = match sanitized.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => sanitized.as_str(),
    };
    if stem.is_empty() {
        "upload".to_string()
    } else {
        stem.to_string()
    }
}

/// Whether a stored book photo name was uploaded by `user_id`
pub fn uploaded_by(filename: &str, user_id: i32) -> bool {
    filename
        .strip_prefix(&format!("{}_", user_id))
        .is_some_and(|rest| !rest.is_empty())
}

#[derive(Clone)]
pub struct StorageService {
    profile_picture_dir: PathBuf,
    book_photo_dir: PathBuf,
    public_base_url: String,
}

impl StorageService {
    /// Create the service, making sure both upload directories exist
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        for dir in [&config.profile_picture_dir, &config.book_photo_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::Internal(format!("Failed to create upload directory {:?}: {}", dir, e))
            })?;
        }

        Ok(Self {
            profile_picture_dir: config.profile_picture_dir.clone(),
            book_photo_dir: config.book_photo_dir.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self, kind: UploadKind) -> &Path {
        match kind {
            UploadKind::ProfilePicture => &self.profile_picture_dir,
            UploadKind::BookPhoto => &self.book_photo_dir,
        }
    }

    /// Validate and write an image, returning its stored filename
    ///
    /// Only PNG, JPEG, GIF and WebP content is accepted and the stored
    /// extension always matches the detected format. When `owner_id` is set
    /// the name is prefixed with it, see [`uploaded_by`].
    pub async fn store(
        &self,
        kind: UploadKind,
        owner_id: Option<i32>,
        file: &UploadedFile,
    ) -> AppResult<String> {
        if file.data.is_empty() {
            return Err(AppError::BadRequest("Please select a file to upload".to_string()));
        }

        let extension = detect_image_extension(file).ok_or_else(|| {
            AppError::BadRequest(
                "Only image files are allowed (PNG, JPEG, GIF or WebP)".to_string(),
            )
        })?;

        let unique = format!("{}_{}.{}", uuid::Uuid::new_v4(), file_stem(file), extension);
        let stored = match owner_id {
            Some(owner_id) => format!("{}_{}", owner_id, unique),
            None => unique,
        };

        let path = self.dir(kind).join(&stored);
        tokio::fs::write(&path, &file.data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store file {:?}: {}", path, e)))?;

        tracing::debug!("Stored upload {:?} ({} bytes)", path, file.data.len());
        Ok(stored)
    }

    /// Whether `filename` names a file previously stored for `kind`
    pub async fn exists(&self, kind: UploadKind, filename: &str) -> bool {
        if filename.is_empty() || sanitize_filename(filename) != filename {
            return false;
        }
        tokio::fs::metadata(self.dir(kind).join(filename))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Best-effort delete; failures are only logged
    pub async fn remove(&self, kind: UploadKind, filename: &str) {
        if sanitize_filename(filename) != filename {
            return;
        }
        let path = self.dir(kind).join(filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove upload {:?}: {}", path, e);
        }
    }

    pub fn public_url(&self, kind: UploadKind, filename: &str) -> String {
        format!(
            "{}/uploads/{}/{}",
            self.public_base_url,
            kind.route_segment(),
            filename
        )
    }
}
