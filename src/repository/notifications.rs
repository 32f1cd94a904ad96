//! Notifications domain methods on Repository

use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::notification::{NewNotification, Notification},
};

impl Repository {
    /// Insert a notification on an open connection or transaction
    pub(crate) async fn notifications_insert(
        conn: &mut PgConnection,
        notification: &NewNotification,
    ) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO notifications (
                user_id, notification_type, message, related_swap_request_id, related_book_id
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.notification_type)
        .bind(&notification.message)
        .bind(notification.related_swap_request_id)
        .bind(notification.related_book_id)
        .fetch_one(conn)
        .await?;
        Ok(id)
    }

    /// Get notification by ID
    pub async fn notifications_get_by_id(&self, id: i32) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification not found with id: {}", id)))
    }

    /// All notifications of a user, newest first
    pub async fn notifications_list_for_user(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Count unread notifications of a user
    pub async fn notifications_count_unread(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Flip to read; the first read timestamp is kept on repeat calls
    pub async fn notifications_mark_read(&self, id: i32) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification not found with id: {}", id)))
    }

    /// Mark every unread notification of a user as read, returning how many changed
    pub async fn notifications_mark_all_read(&self, user_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = NOW()
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
