use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use std::error::Error as StdError;
use super::{ ChatClient, ClientError };
use crate::llm::EndpointConfig;
use crate::models::chat::{ GenerateRequest, GenerateResponse };

#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: HttpClient,
    url: String,
}

impl HttpChatClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(config.url().as_str())
    }
}

/// Flattens a reqwest error and its sources into one line.
fn describe(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn generate(&self, prompt: &str) -> Result<GenerateResponse, ClientError> {
        let req = GenerateRequest {
            prompt: prompt.to_string(),
        };
        debug!("POST {}", self.url);
        let resp = self.http
            .post(&self.url)
            .json(&req)
            .send().await
            .map_err(|e| ClientError::Transport(describe(&e)))?;

        let status = resp.status();
        debug!("{} answered with status {}", self.url, status);
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let data = resp.json::<GenerateResponse>().await?;
        Ok(data)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
