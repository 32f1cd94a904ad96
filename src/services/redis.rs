//! Redis service caching reverse-geocoding results

use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisService {
    conn: ConnectionManager,
}

/// Cache key for a coordinate pair, rounded to about 11 m
pub fn geocode_key(latitude: f64, longitude: f64) -> String {
    format!("geocode:{:.4}:{:.4}", latitude, longitude)
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        // Test connection
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { conn })
    }

    /// Cached location name for a coordinate pair
    pub async fn get_cached_location(&self, latitude: f64, longitude: f64) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = conn
            .get(geocode_key(latitude, longitude))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read geocode cache: {}", e)))?;
        Ok(cached)
    }

    /// Store a location name with expiration (in seconds)
    pub async fn cache_location(
        &self,
        latitude: f64,
        longitude: f64,
        name: &str,
        expiration_seconds: u64,
    ) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(geocode_key(latitude, longitude), name, expiration_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write geocode cache: {}", e)))?;
        Ok(())
    }
}
