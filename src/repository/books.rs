//! Books domain methods on Repository

use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookRequest, BookStatus},
};

/// Books are always read together with their owner's name
pub(super) const BOOK_SELECT: &str = r#"
    SELECT b.*, u.name AS owner_name
    FROM books b
    JOIN users u ON u.id = b.owner_id
"#;

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book not found with id: {}", id))
}

impl Repository {
    /// Get book by ID
    pub async fn books_get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Lock a book row for the rest of the transaction
    pub(crate) async fn books_lock(conn: &mut PgConnection, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1 FOR UPDATE OF b", BOOK_SELECT))
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Books owned by a user, newest ID first
    pub async fn books_list_by_owner(&self, owner_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{} WHERE b.owner_id = $1 ORDER BY b.id DESC",
            BOOK_SELECT
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Available books not owned by the viewer, newest first
    pub async fn books_list_explore(&self, viewer_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{} WHERE b.owner_id <> $1 AND b.status = $2 ORDER BY b.created_at DESC, b.id DESC",
            BOOK_SELECT
        ))
        .bind(viewer_id)
        .bind(BookStatus::Available)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Create a listing
    pub async fn books_create(&self, owner_id: i32, data: &BookRequest) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            WITH b AS (
                INSERT INTO books (
                    title, author, genre, language, book_condition, description,
                    exchange_preference, latitude, longitude, location, status, photo, owner_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING *
            )
            SELECT b.*, u.name AS owner_name
            FROM b
            JOIN users u ON u.id = b.owner_id
            "#,
        )
        .bind(data.title.trim())
        .bind(data.author.trim())
        .bind(data.genre.trim())
        .bind(data.language.trim())
        .bind(data.book_condition)
        .bind(&data.description)
        .bind(&data.exchange_preference)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(&data.location)
        .bind(data.status.unwrap_or(BookStatus::Available))
        .bind(&data.photo_filename)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    /// Replace a listing's fields; absent status and photo keep their value
    pub async fn books_update(&self, id: i32, data: &BookRequest) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            WITH b AS (
                UPDATE books SET
                    title = $2,
                    author = $3,
                    genre = $4,
                    language = $5,
                    book_condition = $6,
                    description = $7,
                    exchange_preference = $8,
                    latitude = $9,
                    longitude = $10,
                    location = $11,
                    status = COALESCE($12, status),
                    photo = COALESCE($13, photo),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT b.*, u.name AS owner_name
            FROM b
            JOIN users u ON u.id = b.owner_id
            "#,
        )
        .bind(id)
        .bind(data.title.trim())
        .bind(data.author.trim())
        .bind(data.genre.trim())
        .bind(data.language.trim())
        .bind(data.book_condition)
        .bind(&data.description)
        .bind(&data.exchange_preference)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(&data.location)
        .bind(data.status)
        .bind(&data.photo_filename)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Whether any listing still references `photo`
    pub async fn books_photo_in_use(&self, photo: &str) -> AppResult<bool> {
        let in_use: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE photo = $1)")
            .bind(photo)
            .fetch_one(&self.pool)
            .await?;
        Ok(in_use)
    }

    /// Set a book's status inside a transaction
    pub(crate) async fn books_set_status(
        conn: &mut PgConnection,
        id: i32,
        status: BookStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE books SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Delete a listing (its swap requests cascade)
    pub async fn books_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
