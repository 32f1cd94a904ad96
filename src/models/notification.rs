//! Notification inbox model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::swap_request::{SwapRequest, SwapRequestStatus};
use crate::error::{AppError, AppResult};

/// Maximum stored message length, in characters
pub const MAX_MESSAGE_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    NewRequest,
    RequestAccepted,
    RequestDeclined,
}

text_enum!(NotificationType {
    NewRequest => "NEW_REQUEST",
    RequestAccepted => "REQUEST_ACCEPTED",
    RequestDeclined => "REQUEST_DECLINED",
});

/// Stored notification
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    #[serde(skip_serializing)]
    pub user_id: i32,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub related_swap_request_id: Option<i32>,
    pub related_book_id: Option<i32>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn ensure_owned_by(&self, user_id: i32) -> AppResult<()> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You are not authorized to update this notification".to_string(),
            ))
        }
    }
}

/// Notification to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i32,
    pub notification_type: NotificationType,
    pub message: String,
    pub related_swap_request_id: Option<i32>,
    pub related_book_id: Option<i32>,
}

impl NewNotification {
    pub fn new(
        user_id: i32,
        notification_type: NotificationType,
        message: &str,
        related_swap_request_id: Option<i32>,
        related_book_id: Option<i32>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            message: message.chars().take(MAX_MESSAGE_LEN).collect(),
            related_swap_request_id,
            related_book_id,
        }
    }

    /// Tells the owner someone asked for their book
    pub fn new_request(
        owner_id: i32,
        requester_name: &str,
        book_id: i32,
        book_title: &str,
        swap_request_id: i32,
    ) -> Self {
        Self::new(
            owner_id,
            NotificationType::NewRequest,
            &format!("{} requested your book \"{}\"", requester_name, book_title),
            Some(swap_request_id),
            Some(book_id),
        )
    }

    /// Tells the requester the owner's decision
    pub fn decision(request: &SwapRequest, book_title: &str, status: SwapRequestStatus) -> Self {
        let (notification_type, verb) = match status {
            SwapRequestStatus::Accepted => (NotificationType::RequestAccepted, "accepted"),
            _ => (NotificationType::RequestDeclined, "declined"),
        };

        Self::new(
            request.requester_id,
            notification_type,
            &format!(
                "{} {} your request for \"{}\"",
                request.owner_name, verb, book_title
            ),
            Some(request.id),
            Some(request.book_id),
        )
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub message: String,
    pub updated: u64,
}
