use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use reqwest::Client;

use crate::error::QuizError;

/// A single HTTP GET: bytes on 2xx, an error otherwise.
#[async_trait]
pub trait NetworkRouting: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, QuizError>;
}

#[derive(Debug, Clone, Default)]
pub struct NetworkClient {
    client: Client,
}

impl NetworkClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl NetworkRouting for NetworkClient {
    async fn fetch(&self, url: &str) -> Result<Bytes, QuizError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        debug!("GET {} status={}", url, status.as_u16());
        if !status.is_success() {
            warn!("GET {} failed status={}", url, status.as_u16());
            return Err(QuizError::HttpStatus(status.as_u16()));
        }

        let bytes = resp.bytes().await?;
        Ok(bytes)
    }
}
