//! User profile endpoints

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{UpdateProfile, UserProfile},
};

use super::{AppJson, AuthenticatedUser};

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserProfile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserProfile>> {
    let profile = state.services.users.get_profile(claims.user_id).await?;
    Ok(Json(profile))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(profile): AppJson<UpdateProfile>,
) -> AppResult<Json<UserProfile>> {
    profile.validate()?;

    let profile = state
        .services
        .users
        .update_profile(claims.user_id, profile)
        .await?;
    Ok(Json(profile))
}
