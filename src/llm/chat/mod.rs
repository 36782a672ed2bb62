pub mod http;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use super::EndpointConfig;
use self::http::HttpChatClient;
use crate::models::chat::GenerateResponse;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(String),
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Status(status.as_u16())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerateResponse, ClientError>;

    fn endpoint(&self) -> &str;
}

pub fn new_client(config: &EndpointConfig) -> Arc<dyn ChatClient> {
    Arc::new(HttpChatClient::from_config(config))
}
