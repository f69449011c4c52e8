use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub max_batch_ops: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let max_batch_ops = env_map
            .get("MAX_BATCH_OPS")
            .map(|s| s.as_str())
            .unwrap_or("500")
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "MAX_BATCH_OPS".to_string(),
                    "must be a valid usize".to_string(),
                )
            })?;

        if max_batch_ops == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_BATCH_OPS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Config {
            port,
            database_path,
            max_batch_ops,
        })
    }
}
