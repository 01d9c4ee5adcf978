use crate::error::StoreError;

/// Connection settings for the storage service, read from the environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
}

impl StoreConfig {
    /// Loads `.env` if present (dotenvy) and reads `DATABASE_URL`.
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| StoreError::Config("DATABASE_URL must be set".to_string()))?;
        Ok(Self { database_url })
    }
}
