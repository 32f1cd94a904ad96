//! BookSwap server
//!
//! REST JSON API for a peer-to-peer book swapping marketplace: users list
//! books they own, browse nearby listings of others, request swaps and get
//! notified of the owner's decision.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
