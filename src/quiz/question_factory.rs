use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::RwLock;
use rand::Rng;

use super::movies_loader::MoviesLoading;
use super::network::NetworkRouting;
use super::{Movie, QuizQuestion};
use crate::error::QuizError;

pub type DelegateResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Listener for everything the factory produces. It is borrowed per call, never owned.
#[async_trait]
pub trait QuestionFactoryDelegate: Send + Sync {
    async fn did_load_data_from_server(&self) -> DelegateResult;
    async fn did_fail_to_load_data(&self, error: QuizError) -> DelegateResult;
    async fn did_receive_next_question(&self, question: QuizQuestion) -> DelegateResult;
    async fn did_fail_to_load_image(&self, error: QuizError) -> DelegateResult;
}

/// Turns the cached movie list into yes/no rating questions.
pub struct QuestionFactory {
    movies_loader: Arc<dyn MoviesLoading>,
    network_client: Arc<dyn NetworkRouting>,
    movies: RwLock<Vec<Movie>>,
    thresholds: RangeInclusive<u8>,
}

impl QuestionFactory {
    pub fn new(
        movies_loader: Arc<dyn MoviesLoading>,
        network_client: Arc<dyn NetworkRouting>,
        thresholds: RangeInclusive<u8>,
    ) -> Self {
        Self {
            movies_loader,
            network_client,
            movies: RwLock::new(Vec::new()),
            thresholds,
        }
    }

    pub fn movies_count(&self) -> usize {
        self.movies.read().len()
    }

    pub async fn load_data(&self, delegate: &dyn QuestionFactoryDelegate) -> DelegateResult {
        match self.movies_loader.load_movies().await {
            Ok(movies) => {
                *self.movies.write() = movies.items;
                delegate.did_load_data_from_server().await
            }
            Err(error) => {
                warn!("failed to load movies: {}", error);
                delegate.did_fail_to_load_data(error).await
            }
        }
    }

    pub async fn request_next_question(
        &self,
        delegate: &dyn QuestionFactoryDelegate,
    ) -> DelegateResult {
        // Pick everything random up front: the rng must not live across an await.
        let picked = {
            let movies = self.movies.read();
            if movies.is_empty() {
                None
            } else {
                let mut rng = rand::thread_rng();
                let movie = movies[rng.gen_range(0..movies.len())].clone();
                let threshold = rng.gen_range(self.thresholds.clone());
                Some((movie, threshold))
            }
        };

        let Some((movie, threshold)) = picked else {
            return delegate.did_fail_to_load_data(QuizError::NoMovies).await;
        };

        let image = match self.network_client.fetch(&movie.resized_image_url()).await {
            Ok(bytes) if bytes.is_empty() => Err(QuizError::EmptyImage),
            other => other,
        };
        let image = match image {
            Ok(bytes) => bytes.to_vec(),
            Err(error) => {
                warn!("failed to load poster for {:?}: {}", movie.title, error);
                return delegate.did_fail_to_load_image(error).await;
            }
        };

        debug!(
            "question about {:?} (rating {}) against threshold {}",
            movie.title, movie.rating, threshold
        );
        let question = make_question(&movie, image, threshold);
        delegate.did_receive_next_question(question).await
    }
}

fn make_question(movie: &Movie, image: Vec<u8>, threshold: u8) -> QuizQuestion {
    let text = format!(
        "Is the rating of this movie greater than {}?",
        threshold
    );
    let correct_answer = movie.rating > f32::from(threshold);
    QuizQuestion::new(image, text, correct_answer)
}
