//! Swap request model and its status transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookResponse;
use crate::error::{AppError, AppResult};

/// Swap request lifecycle: PENDING, then ACCEPTED or DECLINED for good
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapRequestStatus {
    Pending,
    Accepted,
    Declined,
}

text_enum!(SwapRequestStatus {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
    Declined => "DECLINED",
});

impl SwapRequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapRequestStatus::Pending)
    }

    /// Validates a transition from `self` to `next`
    pub fn transition_to(self, next: SwapRequestStatus) -> AppResult<SwapRequestStatus> {
        if next == SwapRequestStatus::Pending {
            return Err(AppError::BadRequest(
                "A request can only be accepted or declined".to_string(),
            ));
        }
        if self.is_terminal() {
            return Err(AppError::Conflict(format!(
                "This request has already been {}",
                self.as_str().to_lowercase()
            )));
        }
        Ok(next)
    }
}

/// Swap request row joined with requester and owner names
#[derive(Debug, Clone, FromRow)]
pub struct SwapRequest {
    pub id: i32,
    pub book_id: i32,
    pub requester_id: i32,
    pub owner_id: i32,
    pub status: SwapRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub requester_name: String,
    pub owner_name: String,
}

impl SwapRequest {
    /// Only the book's owner may accept or decline
    pub fn ensure_owned_by(&self, user_id: i32) -> AppResult<()> {
        if self.owner_id == user_id {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You are not authorized to update this request".to_string(),
            ))
        }
    }
}

/// Accept or decline a request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSwapRequestStatus {
    pub status: SwapRequestStatus,
}

/// Swap request as returned by the API
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequestResponse {
    pub id: i32,
    pub book: BookResponse,
    pub requester_id: i32,
    pub requester_name: String,
    pub owner_id: i32,
    pub owner_name: String,
    pub status: SwapRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRequestResponse {
    pub fn new(request: SwapRequest, book: BookResponse) -> Self {
        Self {
            id: request.id,
            book,
            requester_id: request.requester_id,
            requester_name: request.requester_name,
            owner_id: request.owner_id,
            owner_name: request.owner_name,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}
