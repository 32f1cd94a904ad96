//! Swap request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::swap_request::{SwapRequestResponse, UpdateSwapRequestStatus},
};

use super::{AppJson, AuthenticatedUser};

/// Request a book from its owner
#[utoipa::path(
    post,
    path = "/swap-requests/book/{bookId}",
    tag = "swap-requests",
    security(("bearer_auth" = [])),
    params(
        ("bookId" = i32, Path, description = "Requested book ID")
    ),
    responses(
        (status = 201, description = "Request created", body = SwapRequestResponse),
        (status = 400, description = "Own book", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book unavailable or request already pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_swap_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<SwapRequestResponse>)> {
    let request = state
        .services
        .swap_requests
        .create(claims.user_id, book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Accept or decline a request on one of the current user's books
#[utoipa::path(
    put,
    path = "/swap-requests/{requestId}",
    tag = "swap-requests",
    security(("bearer_auth" = [])),
    params(
        ("requestId" = i32, Path, description = "Swap request ID")
    ),
    request_body = UpdateSwapRequestStatus,
    responses(
        (status = 200, description = "Request updated", body = SwapRequestResponse),
        (status = 400, description = "Invalid target status", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the book owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Request already decided or book unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_swap_request_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(request_id): Path<i32>,
    AppJson(update): AppJson<UpdateSwapRequestStatus>,
) -> AppResult<Json<SwapRequestResponse>> {
    let request = state
        .services
        .swap_requests
        .update_status(claims.user_id, request_id, update.status)
        .await?;
    Ok(Json(request))
}

/// Requests sent by the current user
#[utoipa::path(
    get,
    path = "/swap-requests/outgoing",
    tag = "swap-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sent requests, newest first", body = Vec<SwapRequestResponse>)
    )
)]
pub async fn outgoing_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<SwapRequestResponse>>> {
    let requests = state.services.swap_requests.outgoing(claims.user_id).await?;
    Ok(Json(requests))
}

/// Requests received on the current user's books
#[utoipa::path(
    get,
    path = "/swap-requests/incoming",
    tag = "swap-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Received requests, newest first", body = Vec<SwapRequestResponse>)
    )
)]
pub async fn incoming_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<SwapRequestResponse>>> {
    let requests = state.services.swap_requests.incoming(claims.user_id).await?;
    Ok(Json(requests))
}
