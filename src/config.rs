use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use crate::error::QuizError;

pub const DEFAULT_MOVIES_API_URL: &str = "https://tv-api.com/en/API/Top250Movies/k_zcuw1ytf";

/// Questions in one round.
pub const DEFAULT_QUESTIONS_PER_ROUND: u32 = 10;

/// How long the answer feedback stays on screen before the next question.
pub const DEFAULT_ANSWER_DELAY_MS: u64 = 1000;

pub const DEFAULT_RATING_THRESHOLD: u8 = 7;

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub movies_api_url: String,
    /// JSON file holding per-chat statistics.
    pub stats_file: String,
    /// SQLite database used for dialogue state.
    pub dialogue_db: String,
    pub questions_per_round: u32,
    pub answer_delay: Duration,
    pub rating_thresholds: RangeInclusive<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            movies_api_url: DEFAULT_MOVIES_API_URL.to_string(),
            stats_file: "stats.json".to_string(),
            dialogue_db: "db.sqlite".to_string(),
            questions_per_round: DEFAULT_QUESTIONS_PER_ROUND,
            answer_delay: Duration::from_millis(DEFAULT_ANSWER_DELAY_MS),
            rating_thresholds: DEFAULT_RATING_THRESHOLD..=DEFAULT_RATING_THRESHOLD,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, QuizError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QuizError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let questions_per_round =
            parse_or(&lookup, "QUESTIONS_PER_ROUND", defaults.questions_per_round)?;
        if questions_per_round == 0 {
            return Err(config_error("QUESTIONS_PER_ROUND", "0"));
        }

        let min = parse_or(&lookup, "RATING_THRESHOLD_MIN", *defaults.rating_thresholds.start())?;
        let max = parse_or(&lookup, "RATING_THRESHOLD_MAX", *defaults.rating_thresholds.end())?;
        if min > max {
            return Err(config_error(
                "RATING_THRESHOLD_MIN",
                &format!("{} > {}", min, max),
            ));
        }

        let answer_delay_ms = parse_or(&lookup, "ANSWER_DELAY_MS", DEFAULT_ANSWER_DELAY_MS)?;

        Ok(Self {
            movies_api_url: lookup("MOVIES_API_URL").unwrap_or(defaults.movies_api_url),
            stats_file: lookup("STATS_FILE").unwrap_or(defaults.stats_file),
            dialogue_db: lookup("DIALOGUE_DB").unwrap_or(defaults.dialogue_db),
            questions_per_round,
            answer_delay: Duration::from_millis(answer_delay_ms),
            rating_thresholds: min..=max,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, QuizError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| config_error(key, &raw)),
    }
}

fn config_error(key: &str, value: &str) -> QuizError {
    QuizError::Config {
        key: key.to_string(),
        value: value.to_string(),
    }
}
