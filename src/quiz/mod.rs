pub mod movies_loader;
pub mod network;
pub mod presenter;
pub mod question_factory;
pub mod settings_store;
pub mod statistics;

use serde::{Deserialize, Deserializer};

/// Body of the top-movies endpoint.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct MostPopularMovies {
    #[serde(default, rename = "errorMessage")]
    pub error_message: String,
    #[serde(default)]
    pub items: Vec<Movie>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct Movie {
    pub title: String,
    #[serde(rename = "image")]
    pub image_url: String,
    #[serde(rename = "imDbRating", default, deserialize_with = "deserialize_rating")]
    pub rating: f32,
}

impl Movie {
    /// The API hands out full-size posters; ask for the 600px wide variant instead.
    pub fn resized_image_url(&self) -> String {
        match self.image_url.rfind("._") {
            Some(idx) => format!("{}V0_UX600_.jpg", &self.image_url[..idx + 2]),
            None => self.image_url.clone(),
        }
    }
}

// The API sends ratings as strings ("9.2", sometimes ""), but accept plain numbers too.
fn deserialize_rating<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rating {
        Number(f32),
        Text(String),
        Null(()),
    }

    Ok(match Rating::deserialize(deserializer)? {
        Rating::Number(value) => value,
        Rating::Text(text) => text.trim().parse().unwrap_or(0.0),
        Rating::Null(()) => 0.0,
    })
}

/// A yes/no question about one movie, ready to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    pub image: Vec<u8>,
    pub text: String,
    pub correct_answer: bool,
}

impl QuizQuestion {
    pub fn new(image: Vec<u8>, text: String, correct_answer: bool) -> Self {
        Self {
            image,
            text,
            correct_answer,
        }
    }
}
