use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;

use super::settings_store::SettingsStore;
use crate::error::QuizError;

const KEY_CORRECT: &str = "correct";
const KEY_BEST_GAME_CORRECT: &str = "bestGameCorrect";
const KEY_BEST_GAME_DATE: &str = "bestGame";
const KEY_GAMES_COUNT: &str = "gamesCount";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameResult {
    pub correct: u32,
    pub total: u32,
    pub date: DateTime<Utc>,
}

impl GameResult {
    pub fn new(correct: u32, total: u32, date: DateTime<Utc>) -> Self {
        Self {
            correct,
            total,
            date,
        }
    }

    /// Strictly higher correct/total ratio. Equal ratios keep the older record.
    pub fn is_better_than(&self, other: &GameResult) -> bool {
        if self.total == 0 {
            return false;
        }
        if other.total == 0 {
            return true;
        }
        u64::from(self.correct) * u64::from(other.total)
            > u64::from(other.correct) * u64::from(self.total)
    }
}

/// Per-chat statistics on top of a flat settings store.
pub struct StatisticService {
    storage: Arc<dyn SettingsStore>,
    namespace: String,
    questions_per_game: u32,
}

impl StatisticService {
    pub fn new(
        storage: Arc<dyn SettingsStore>,
        namespace: impl Into<String>,
        questions_per_game: u32,
    ) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
            questions_per_game,
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }

    fn read_count(&self, name: &str) -> u32 {
        u32::try_from(self.storage.integer(&self.key(name))).unwrap_or(0)
    }

    pub fn games_count(&self) -> u32 {
        self.read_count(KEY_GAMES_COUNT)
    }

    /// Correct answers over all games.
    pub fn correct_answers(&self) -> u32 {
        self.read_count(KEY_CORRECT)
    }

    pub fn best_game(&self) -> Option<GameResult> {
        let date = self.storage.date(&self.key(KEY_BEST_GAME_DATE))?;
        Some(GameResult::new(
            self.read_count(KEY_BEST_GAME_CORRECT),
            self.questions_per_game,
            date,
        ))
    }

    pub fn total_accuracy(&self) -> f64 {
        let games = self.games_count();
        if games == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers()) / (f64::from(games) * f64::from(self.questions_per_game))
            * 100.0
    }

    /// Records a finished round. Each field is written on its own.
    pub fn store(&self, correct: u32, total: u32) -> Result<(), QuizError> {
        let result = GameResult::new(correct, total, Utc::now());

        self.storage.set_integer(
            &self.key(KEY_CORRECT),
            i64::from(self.correct_answers()) + i64::from(correct),
        )?;

        let is_record = match self.best_game() {
            Some(best) => result.is_better_than(&best),
            None => true,
        };
        if is_record {
            self.storage
                .set_integer(&self.key(KEY_BEST_GAME_CORRECT), i64::from(result.correct))?;
            self.storage
                .set_date(&self.key(KEY_BEST_GAME_DATE), result.date)?;
        }

        self.storage.set_integer(
            &self.key(KEY_GAMES_COUNT),
            i64::from(self.games_count()) + 1,
        )?;

        info!(
            "{}: stored game {}/{} (record: {})",
            self.namespace, correct, total, is_record
        );
        Ok(())
    }
}
