//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, files, health, notifications, swap_requests, users};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BookSwap API",
        version = "0.1.0",
        description = "Peer-to-peer book swapping REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::signup,
        auth::login,
        // Users
        users::get_profile,
        users::update_profile,
        // Books
        books::add_book,
        books::my_books,
        books::explore_books,
        books::get_book,
        books::update_book,
        books::delete_book,
        // Swap requests
        swap_requests::create_swap_request,
        swap_requests::update_swap_request_status,
        swap_requests::outgoing_requests,
        swap_requests::incoming_requests,
        // Notifications
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_as_read,
        notifications::mark_all_as_read,
        // Files
        files::upload_book_photo,
    ),
    components(
        schemas(
            // Auth & users
            crate::models::user::SignUpRequest,
            crate::models::user::LoginRequest,
            crate::models::user::AuthResponse,
            crate::models::user::UpdateProfile,
            crate::models::user::UserProfile,
            // Books
            crate::models::book::BookCondition,
            crate::models::book::BookStatus,
            crate::models::book::BookRequest,
            crate::models::book::BookResponse,
            // Swap requests
            crate::models::swap_request::SwapRequestStatus,
            crate::models::swap_request::UpdateSwapRequestStatus,
            crate::models::swap_request::SwapRequestResponse,
            // Notifications
            crate::models::notification::NotificationType,
            crate::models::notification::Notification,
            crate::models::notification::UnreadCount,
            crate::models::notification::MarkAllReadResponse,
            // Files
            files::BookPhotoUpload,
            files::UploadResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup and login"),
        (name = "users", description = "Own profile"),
        (name = "books", description = "Book listings"),
        (name = "swap-requests", description = "Swap request workflow"),
        (name = "notifications", description = "Notification inbox"),
        (name = "files", description = "Image uploads")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
