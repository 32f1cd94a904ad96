//! Swap request workflow service

use futures_util::future::try_join_all;

use super::books::BooksService;
use crate::{
    error::AppResult,
    models::swap_request::{SwapRequest, SwapRequestResponse, SwapRequestStatus},
    repository::Repository,
};

#[derive(Clone)]
pub struct SwapRequestsService {
    repository: Repository,
    books: BooksService,
}

impl SwapRequestsService {
    pub fn new(repository: Repository, books: BooksService) -> Self {
        Self { repository, books }
    }

    /// Ask the owner of `book_id` for their book
    pub async fn create(&self, requester_id: i32, book_id: i32) -> AppResult<SwapRequestResponse> {
        let id = self.repository.swap_requests_create(book_id, requester_id).await?;
        tracing::info!("User {} requested book {} (request {})", requester_id, book_id, id);

        let request = self.repository.swap_requests_get_by_id(id).await?;
        self.to_response(request).await
    }

    /// Accept or decline a request on one of the caller's books
    pub async fn update_status(
        &self,
        actor_id: i32,
        id: i32,
        status: SwapRequestStatus,
    ) -> AppResult<SwapRequestResponse> {
        self.repository
            .swap_requests_update_status(id, actor_id, status)
            .await?;
        tracing::info!("User {} set swap request {} to {}", actor_id, id, status);

        let request = self.repository.swap_requests_get_by_id(id).await?;
        self.to_response(request).await
    }

    /// Requests the caller has sent
    pub async fn outgoing(&self, requester_id: i32) -> AppResult<Vec<SwapRequestResponse>> {
        let requests = self.repository.swap_requests_list_by_requester(requester_id).await?;
        self.to_responses(requests).await
    }

    /// Requests on the caller's books
    pub async fn incoming(&self, owner_id: i32) -> AppResult<Vec<SwapRequestResponse>> {
        let requests = self.repository.swap_requests_list_by_owner(owner_id).await?;
        self.to_responses(requests).await
    }

    /// The embedded book is seen from the requester's position
    async fn to_response(&self, request: SwapRequest) -> AppResult<SwapRequestResponse> {
        let book = self.repository.books_get_by_id(request.book_id).await?;
        let viewer = self.books.viewer_position(request.requester_id).await?;
        let book = self.books.to_response(book, viewer).await;
        Ok(SwapRequestResponse::new(request, book))
    }

    async fn to_responses(&self, requests: Vec<SwapRequest>) -> AppResult<Vec<SwapRequestResponse>> {
        try_join_all(requests.into_iter().map(|request| self.to_response(request))).await
    }
}
