//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::Multipart;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{AuthResponse, LoginRequest, SignUpRequest},
};

use super::{
    files::{multipart_error, read_file},
    AppJson,
};

/// Register a new account
///
/// Multipart form with a JSON `signUpRequest` part and an optional
/// `profilePicture` image part.
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body(content_type = "multipart/form-data", content = SignUpRequest),
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let mut request: Option<SignUpRequest> = None;
    let mut profile_picture = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("signUpRequest") => {
                let raw = field.bytes().await.map_err(multipart_error)?;
                let parsed = serde_json::from_slice(&raw)
                    .map_err(|e| AppError::BadRequest(format!("Invalid signUpRequest: {}", e)))?;
                request = Some(parsed);
            }
            Some("profilePicture") => {
                let file = read_file(field).await?;
                // browsers send an empty part when no file was picked
                if !file.data.is_empty() {
                    profile_picture = Some(file);
                }
            }
            _ => {}
        }
    }

    let request = request
        .ok_or_else(|| AppError::BadRequest("Missing signUpRequest part".to_string()))?;
    request.validate()?;

    let response = state.services.users.signup(request, profile_picture).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state
        .services
        .users
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}
