//! Business logic services

pub mod books;
pub mod geocoding;
pub mod notifications;
pub mod redis;
pub mod storage;
pub mod swap_requests;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub books: books::BooksService,
    pub swap_requests: swap_requests::SwapRequestsService,
    pub notifications: notifications::NotificationsService,
    pub storage: storage::StorageService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub async fn new(
        repository: Repository,
        config: &AppConfig,
        redis_service: Option<redis::RedisService>,
    ) -> AppResult<Self> {
        let storage = storage::StorageService::new(&config.storage).await?;
        let geocoder: Arc<dyn geocoding::Geocoder> = Arc::new(geocoding::GoogleGeocoder::new(
            config.geocoding.clone(),
            redis_service,
        )?);

        let books = books::BooksService::new(repository.clone(), storage.clone(), geocoder.clone());

        Ok(Self {
            users: users::UsersService::new(
                repository.clone(),
                config.auth.clone(),
                storage.clone(),
                geocoder,
            ),
            swap_requests: swap_requests::SwapRequestsService::new(repository.clone(), books.clone()),
            notifications: notifications::NotificationsService::new(repository.clone()),
            books,
            storage,
            repository,
        })
    }
}
