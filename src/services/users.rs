//! Authentication and user profile service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::{
    geocoding::{resolve_location_name, Geocoder},
    storage::{StorageService, UploadKind, UploadedFile},
};
use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{AuthResponse, SignUpRequest, UpdateProfile, User, UserClaims, UserProfile},
    repository::Repository,
};

/// Shown on profiles without any location
pub const LOCATION_NOT_SET: &str = "Location not set";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    storage: StorageService,
    geocoder: Arc<dyn Geocoder>,
}

impl UsersService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        storage: StorageService,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self { repository, config, storage, geocoder }
    }

    /// Register a new account and log it in
    pub async fn signup(
        &self,
        request: SignUpRequest,
        profile_picture: Option<UploadedFile>,
    ) -> AppResult<AuthResponse> {
        if self.repository.users_email_exists(request.email.trim()).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(&request.password)?;

        let stored_picture = match &profile_picture {
            Some(file) => Some(self.storage.store(UploadKind::ProfilePicture, None, file).await?),
            None => None,
        };

        let user = match self
            .repository
            .users_create(&request, &password_hash, stored_picture.as_deref())
            .await
        {
            Ok(user) => user,
            Err(e) => {
                if let Some(name) = &stored_picture {
                    self.storage.remove(UploadKind::ProfilePicture, name).await;
                }
                return Err(e);
            }
        };

        tracing::info!("User {} registered", user.id);
        self.issue_token(&user)
    }

    /// Authenticate by email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let user = self
            .repository
            .users_get_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !verify_password(&user.password, password)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        self.issue_token(&user)
    }

    /// Get the caller's profile
    pub async fn get_profile(&self, user_id: i32) -> AppResult<UserProfile> {
        let user = self.repository.users_get_by_id(user_id).await?;
        Ok(self.to_profile(user).await)
    }

    /// Update the caller's profile
    pub async fn update_profile(&self, user_id: i32, profile: UpdateProfile) -> AppResult<UserProfile> {
        let user = self.repository.users_update_profile(user_id, &profile).await?;
        Ok(self.to_profile(user).await)
    }

    fn issue_token(&self, user: &User) -> AppResult<AuthResponse> {
        let token = UserClaims::for_user(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(AuthResponse {
            token,
            name: user.name.clone(),
        })
    }

    async fn to_profile(&self, user: User) -> UserProfile {
        let location_name =
            resolve_location_name(&self.geocoder, user.coordinates(), user.location.as_deref())
                .await
                .unwrap_or_else(|| LOCATION_NOT_SET.to_string());

        let profile_picture_url = user
            .profile_picture
            .as_deref()
            .map(|f| self.storage.public_url(UploadKind::ProfilePicture, f));

        UserProfile {
            id: user.id,
            name: user.name,
            email: user.email,
            latitude: user.latitude,
            longitude: user.longitude,
            location_name,
            profile_picture_url,
        }
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
