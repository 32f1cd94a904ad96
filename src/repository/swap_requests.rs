//! Swap requests domain methods on Repository
//!
//! Create and status changes run in one transaction together with the book
//! status flip and the notification insert, with the book row locked.

use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        notification::NewNotification,
        swap_request::{SwapRequest, SwapRequestStatus},
    },
};

const SWAP_SELECT: &str = r#"
    SELECT sr.*, r.name AS requester_name, o.name AS owner_name
    FROM swap_requests sr
    JOIN users r ON r.id = sr.requester_id
    JOIN users o ON o.id = sr.owner_id
"#;

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Swap request not found with id: {}", id))
}

impl Repository {
    /// Get swap request by ID
    pub async fn swap_requests_get_by_id(&self, id: i32) -> AppResult<SwapRequest> {
        sqlx::query_as::<_, SwapRequest>(&format!("{} WHERE sr.id = $1", SWAP_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn swap_requests_lock(conn: &mut PgConnection, id: i32) -> AppResult<SwapRequest> {
        sqlx::query_as::<_, SwapRequest>(&format!(
            "{} WHERE sr.id = $1 FOR UPDATE OF sr",
            SWAP_SELECT
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Requests sent by a user, newest first
    pub async fn swap_requests_list_by_requester(
        &self,
        requester_id: i32,
    ) -> AppResult<Vec<SwapRequest>> {
        let rows = sqlx::query_as::<_, SwapRequest>(&format!(
            "{} WHERE sr.requester_id = $1 ORDER BY sr.created_at DESC, sr.id DESC",
            SWAP_SELECT
        ))
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Requests received on a user's books, newest first
    pub async fn swap_requests_list_by_owner(&self, owner_id: i32) -> AppResult<Vec<SwapRequest>> {
        let rows = sqlx::query_as::<_, SwapRequest>(&format!(
            "{} WHERE sr.owner_id = $1 ORDER BY sr.created_at DESC, sr.id DESC",
            SWAP_SELECT
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Open a pending request on a book and notify its owner
    pub async fn swap_requests_create(&self, book_id: i32, requester_id: i32) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let book = Self::books_lock(&mut *tx, book_id).await?;
        book.ensure_requestable_by(requester_id)?;

        let pending: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM swap_requests
                WHERE book_id = $1 AND requester_id = $2 AND status = $3
            )
            "#,
        )
        .bind(book_id)
        .bind(requester_id)
        .bind(SwapRequestStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        if pending {
            return Err(AppError::Conflict(
                "You already have a pending request for this book".to_string(),
            ));
        }

        let requester_name: String = sqlx::query_scalar("SELECT name FROM users WHERE id = $1")
            .bind(requester_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", requester_id)))?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO swap_requests (book_id, requester_id, owner_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(requester_id)
        .bind(book.owner_id)
        .bind(SwapRequestStatus::Pending)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(e, "You already have a pending request for this book")
        })?;

        let notification =
            NewNotification::new_request(book.owner_id, &requester_name, book.id, &book.title, id);
        Self::notifications_insert(&mut *tx, &notification).await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Accept or decline a pending request as the book's owner
    ///
    /// Accepting marks the book as lent out. The requester is notified either way.
    pub async fn swap_requests_update_status(
        &self,
        id: i32,
        actor_id: i32,
        status: SwapRequestStatus,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let request = Self::swap_requests_lock(&mut *tx, id).await?;
        request.ensure_owned_by(actor_id)?;
        let next = request.status.transition_to(status)?;

        let book = Self::books_lock(&mut *tx, request.book_id).await?;

        if next == SwapRequestStatus::Accepted {
            if book.status != BookStatus::Available {
                return Err(AppError::Conflict(
                    "This book is no longer available".to_string(),
                ));
            }
            Self::books_set_status(&mut *tx, book.id, BookStatus::LentOut).await?;
        }

        sqlx::query("UPDATE swap_requests SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        let notification = NewNotification::decision(&request, &book.title, next);
        Self::notifications_insert(&mut *tx, &notification).await?;

        tx.commit().await?;
        Ok(())
    }
}
