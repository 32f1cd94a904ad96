//! Book listing model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    geo,
};

/// Physical condition of a listed copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookCondition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

text_enum!(BookCondition {
    New => "NEW",
    LikeNew => "LIKE_NEW",
    Good => "GOOD",
    Fair => "FAIR",
    Poor => "POOR",
});

/// Listing availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    Available,
    LentOut,
}

text_enum!(BookStatus {
    Available => "AVAILABLE",
    LentOut => "LENT_OUT",
});

/// Book row joined with its owner's name
#[derive(Debug, Clone, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub language: String,
    pub book_condition: BookCondition,
    pub description: Option<String>,
    /// Stored filename of the photo
    pub photo: Option<String>,
    pub exchange_preference: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
    pub status: BookStatus,
    pub owner_id: i32,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        geo::coordinates(self.latitude, self.longitude)
    }

    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.owner_id == user_id
    }

    /// Fails unless `user_id` owns this listing
    pub fn ensure_owned_by(&self, user_id: i32, action: &str) -> AppResult<()> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "You are not authorized to {} this book",
                action
            )))
        }
    }

    /// Checks that `requester_id` may open a swap request on this listing
    pub fn ensure_requestable_by(&self, requester_id: i32) -> AppResult<()> {
        if self.is_owned_by(requester_id) {
            return Err(AppError::BadRequest(
                "You cannot request your own book".to_string(),
            ));
        }
        if self.status != BookStatus::Available {
            return Err(AppError::Conflict(
                "This book is not available for swapping".to_string(),
            ));
        }
        Ok(())
    }
}

/// Create or update a listing
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    #[validate(custom(function = "crate::models::not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    #[validate(custom(function = "crate::models::not_blank"))]
    pub author: String,
    #[validate(length(min = 1, max = 100, message = "Genre must be 1-100 characters"))]
    #[validate(custom(function = "crate::models::not_blank"))]
    pub genre: String,
    #[validate(length(min = 1, max = 100, message = "Language must be 1-100 characters"))]
    #[validate(custom(function = "crate::models::not_blank"))]
    pub language: String,
    pub book_condition: BookCondition,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub exchange_preference: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub longitude: Option<f64>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    /// Defaults to AVAILABLE on create; unchanged on update when omitted
    pub status: Option<BookStatus>,
    /// Filename returned by the book photo upload endpoint
    pub photo_filename: Option<String>,
}

/// Listing as returned by the API, decorated for the viewer
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub language: String,
    pub book_condition: BookCondition,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub exchange_preference: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
    pub status: BookStatus,
    pub owner_id: i32,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub location_name: Option<String>,
    /// Distance from the viewer, when both positions are known
    pub distance_km: Option<f64>,
}

impl BookResponse {
    pub fn new(
        book: Book,
        photo_url: Option<String>,
        location_name: Option<String>,
        viewer: Option<(f64, f64)>,
    ) -> Self {
        let distance_km = geo::distance_km(viewer, book.coordinates());

        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            language: book.language,
            book_condition: book.book_condition,
            description: book.description,
            photo_url,
            exchange_preference: book.exchange_preference,
            latitude: book.latitude,
            longitude: book.longitude,
            location: book.location,
            status: book.status,
            owner_id: book.owner_id,
            owner_name: book.owner_name,
            created_at: book.created_at,
            updated_at: book.updated_at,
            location_name,
            distance_km,
        }
    }
}
