//! Notification inbox endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::notification::{MarkAllReadResponse, Notification, UnreadCount},
};

use super::AuthenticatedUser;

/// Current user's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>)
    )
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state.services.notifications.list(claims.user_id).await?;
    Ok(Json(notifications))
}

/// Number of unread notifications
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread count", body = UnreadCount)
    )
)]
pub async fn unread_count(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UnreadCount>> {
    let count = state.services.notifications.unread_count(claims.user_id).await?;
    Ok(Json(count))
}

/// Mark a notification as read
#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 403, description = "Not the recipient", body = crate::error::ErrorResponse),
        (status = 404, description = "Notification not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_as_read(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Notification>> {
    let notification = state
        .services
        .notifications
        .mark_as_read(claims.user_id, id)
        .await?;
    Ok(Json(notification))
}

/// Mark all of the current user's notifications as read
#[utoipa::path(
    put,
    path = "/notifications/mark-all-read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread notifications flipped", body = MarkAllReadResponse)
    )
)]
pub async fn mark_all_as_read(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let response = state
        .services
        .notifications
        .mark_all_as_read(claims.user_id)
        .await?;
    Ok(Json(response))
}
