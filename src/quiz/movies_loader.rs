use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use super::network::NetworkRouting;
use super::MostPopularMovies;
use crate::error::QuizError;

#[async_trait]
pub trait MoviesLoading: Send + Sync {
    async fn load_movies(&self) -> Result<MostPopularMovies, QuizError>;
}

pub struct MoviesLoader {
    network_client: Arc<dyn NetworkRouting>,
    url: String,
}

impl MoviesLoader {
    pub fn new(network_client: Arc<dyn NetworkRouting>, url: String) -> Self {
        Self {
            network_client,
            url,
        }
    }
}

#[async_trait]
impl MoviesLoading for MoviesLoader {
    /// One attempt, no retries. A body carrying `errorMessage` counts as a failure.
    async fn load_movies(&self) -> Result<MostPopularMovies, QuizError> {
        let data = self.network_client.fetch(&self.url).await?;
        let movies: MostPopularMovies = serde_json::from_slice(&data)?;

        if !movies.error_message.is_empty() {
            warn!("movies API reported an error: {}", movies.error_message);
            return Err(QuizError::Server {
                message: movies.error_message,
            });
        }

        info!("loaded {} movies", movies.items.len());
        Ok(movies)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    enum Stub {
        Body(&'static str),
        Status(u16),
    }

    #[async_trait]
    impl NetworkRouting for Stub {
        async fn fetch(&self, _url: &str) -> Result<Bytes, QuizError> {
            match self {
                Stub::Body(body) => Ok(Bytes::from_static(body.as_bytes())),
                Stub::Status(code) => Err(QuizError::HttpStatus(*code)),
            }
        }
    }

    fn loader(stub: Stub) -> MoviesLoader {
        MoviesLoader::new(Arc::new(stub), "http://movies.test/top".to_string())
    }

    #[tokio::test]
    async fn test_load_success() {
        let movies = loader(Stub::Body(
            r#"{"items":[{"title":"Heat","image":"https://x/heat.jpg","imDbRating":"8.3"}],"errorMessage":""}"#,
        ))
        .load_movies()
        .await
        .unwrap();
        assert_eq!(movies.items.len(), 1);
        assert_eq!(movies.items[0].title, "Heat");
    }

    #[tokio::test]
    async fn test_server_error_message_is_a_failure() {
        let err = loader(Stub::Body(r#"{"items":[],"errorMessage":"Invalid API Key"}"#))
            .load_movies()
            .await
            .unwrap_err();
        match err {
            QuizError::Server { message } => assert_eq!(message, "Invalid API Key"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_error() {
        let err = loader(Stub::Body("<html>oops</html>"))
            .load_movies()
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Decode(_)));
    }

    #[tokio::test]
    async fn test_network_error_passes_through() {
        let err = loader(Stub::Status(503)).load_movies().await.unwrap_err();
        assert!(matches!(err, QuizError::HttpStatus(503)));
    }
}
