//! Book listing endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{BookRequest, BookResponse},
};

use super::{AppJson, AuthenticatedUser};

/// List a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book listed", body = BookResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Photo uploaded by another user", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(request): AppJson<BookRequest>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    request.validate()?;

    let book = state.services.books.add_book(claims.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Books listed by the current user
#[utoipa::path(
    get,
    path = "/books/my-books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own listings, newest first", body = Vec<BookResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookResponse>>> {
    let books = state.services.books.get_my_books(claims.user_id).await?;
    Ok(Json(books))
}

/// Available books of other users
#[utoipa::path(
    get,
    path = "/books/explore",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available listings of other users", body = Vec<BookResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn explore_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookResponse>>> {
    let books = state.services.books.get_explore_books(claims.user_id).await?;
    Ok(Json(books))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.books.get_book(claims.user_id, id).await?;
    Ok(Json(book))
}

/// Update one of the current user's books
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the owner, or photo uploaded by another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(request): AppJson<BookRequest>,
) -> AppResult<Json<BookResponse>> {
    request.validate()?;

    let book = state
        .services
        .books
        .update_book(claims.user_id, id, request)
        .await?;
    Ok(Json(book))
}

/// Delete one of the current user's books
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Not the owner, or photo uploaded by another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.books.delete_book(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
