//! Book listings service

use std::sync::Arc;

use super::{
    geocoding::{resolve_location_name, resolve_location_names, Geocoder},
    storage::{uploaded_by, StorageService, UploadKind},
};
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookRequest, BookResponse},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    storage: StorageService,
    geocoder: Arc<dyn Geocoder>,
}

impl BooksService {
    pub fn new(repository: Repository, storage: StorageService, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { repository, storage, geocoder }
    }

    /// Create a listing owned by the caller
    pub async fn add_book(&self, owner_id: i32, request: BookRequest) -> AppResult<BookResponse> {
        self.check_photo(owner_id, &request, None).await?;

        let book = self.repository.books_create(owner_id, &request).await?;
        tracing::info!("User {} listed book {}", owner_id, book.id);

        let viewer = self.viewer_position(owner_id).await?;
        Ok(self.to_response(book, viewer).await)
    }

    /// Listings of the caller
    pub async fn get_my_books(&self, owner_id: i32) -> AppResult<Vec<BookResponse>> {
        let books = self.repository.books_list_by_owner(owner_id).await?;
        let viewer = self.viewer_position(owner_id).await?;
        Ok(self.to_responses(books, viewer).await)
    }

    /// Available listings of other users
    pub async fn get_explore_books(&self, viewer_id: i32) -> AppResult<Vec<BookResponse>> {
        let books = self.repository.books_list_explore(viewer_id).await?;
        let viewer = self.viewer_position(viewer_id).await?;
        Ok(self.to_responses(books, viewer).await)
    }

    pub async fn get_book(&self, viewer_id: i32, id: i32) -> AppResult<BookResponse> {
        let book = self.repository.books_get_by_id(id).await?;
        let viewer = self.viewer_position(viewer_id).await?;
        Ok(self.to_response(book, viewer).await)
    }

    /// Update a listing; only its owner may do so
    pub async fn update_book(
        &self,
        caller_id: i32,
        id: i32,
        request: BookRequest,
    ) -> AppResult<BookResponse> {
        let current = self.repository.books_get_by_id(id).await?;
        current.ensure_owned_by(caller_id, "update")?;
        self.check_photo(caller_id, &request, current.photo.as_deref()).await?;

        let book = self.repository.books_update(id, &request).await?;

        if let Some(old) = current.photo.as_deref() {
            if book.photo.as_deref() != Some(old) {
                self.release_photo(old).await;
            }
        }

        let viewer = self.viewer_position(caller_id).await?;
        Ok(self.to_response(book, viewer).await)
    }

    /// Delete a listing; only its owner may do so
    pub async fn delete_book(&self, caller_id: i32, id: i32) -> AppResult<()> {
        let book = self.repository.books_get_by_id(id).await?;
        book.ensure_owned_by(caller_id, "delete")?;

        self.repository.books_delete(id).await?;
        tracing::info!("User {} deleted book {}", caller_id, id);

        if let Some(photo) = book.photo.as_deref() {
            self.release_photo(photo).await;
        }
        Ok(())
    }

    /// Decorate a book for a viewer at `viewer` (photo URL, place name, distance)
    pub async fn to_response(&self, book: Book, viewer: Option<(f64, f64)>) -> BookResponse {
        let location_name =
            resolve_location_name(&self.geocoder, book.coordinates(), book.location.as_deref()).await;
        self.decorate(book, location_name, viewer)
    }

    async fn to_responses(&self, books: Vec<Book>, viewer: Option<(f64, f64)>) -> Vec<BookResponse> {
        let names = {
            let places: Vec<_> = books
                .iter()
                .map(|b| (b.coordinates(), b.location.as_deref()))
                .collect();
            resolve_location_names(&self.geocoder, &places).await
        };

        books
            .into_iter()
            .zip(names)
            .map(|(book, location_name)| self.decorate(book, location_name, viewer))
            .collect()
    }

    fn decorate(
        &self,
        book: Book,
        location_name: Option<String>,
        viewer: Option<(f64, f64)>,
    ) -> BookResponse {
        let photo_url = book
            .photo
            .as_deref()
            .map(|f| self.storage.public_url(UploadKind::BookPhoto, f));
        BookResponse::new(book, photo_url, location_name, viewer)
    }

    pub async fn viewer_position(&self, user_id: i32) -> AppResult<Option<(f64, f64)>> {
        Ok(self.repository.users_get_by_id(user_id).await?.coordinates())
    }

    async fn check_photo(
        &self,
        caller_id: i32,
        request: &BookRequest,
        current: Option<&str>,
    ) -> AppResult<()> {
        let Some(name) = request.photo_filename.as_deref() else {
            return Ok(());
        };
        if !self.storage.exists(UploadKind::BookPhoto, name).await {
            return Err(AppError::BadRequest(format!("Unknown photo file: {}", name)));
        }
        if !may_attach_photo(caller_id, name, current) {
            return Err(AppError::Authorization(
                "You can only attach photos you uploaded".to_string(),
            ));
        }
        Ok(())
    }

    /// Delete a photo file once no listing references it anymore
    async fn release_photo(&self, photo: &str) {
        match self.repository.books_photo_in_use(photo).await {
            Ok(false) => self.storage.remove(UploadKind::BookPhoto, photo).await,
            Ok(true) => tracing::debug!("Photo {} still in use, keeping it", photo),
            Err(e) => tracing::warn!("Could not check usage of photo {}: {}", photo, e),
        }
    }
}

/// A listing may keep its current photo or take one its owner uploaded
fn may_attach_photo(caller_id: i32, name: &str, current: Option<&str>) -> bool {
    current == Some(name) || uploaded_by(name, caller_id)
}
