pub mod chat;
use thiserror::Error;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/generate/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint {
        url: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    url: Url,
}

impl EndpointConfig {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidEndpoint {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self { url }),
            other =>
                Err(ConfigError::InvalidEndpoint {
                    url: trimmed.to_string(),
                    reason: format!("unsupported scheme '{}'", other),
                }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}
