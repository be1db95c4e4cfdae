use super::statistics::StatisticService;
use super::QuizQuestion;
use crate::error::QuizError;

const NO_BEST_GAME_DATE: &str = "no date yet";

/// What one question looks like on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizStepViewModel {
    pub image: Vec<u8>,
    pub question: String,
    pub question_number: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizResultsViewModel {
    pub title: String,
    pub text: String,
    pub button_text: String,
}

/// Where the round goes after an answer.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundStep {
    Next(MovieQuizPresenter),
    Finished {
        round: MovieQuizPresenter,
        results: QuizResultsViewModel,
    },
}

/// Progress through the current round. Lives inside the dialogue state between updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MovieQuizPresenter {
    pub questions_amount: u32,
    current_question_index: u32,
    correct_answers: u32,
}

impl MovieQuizPresenter {
    pub fn new(questions_amount: u32) -> Self {
        Self {
            questions_amount,
            current_question_index: 0,
            correct_answers: 0,
        }
    }

    pub fn current_question_index(&self) -> u32 {
        self.current_question_index
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn convert(&self, model: &QuizQuestion) -> QuizStepViewModel {
        QuizStepViewModel {
            image: model.image.clone(),
            question: model.text.clone(),
            question_number: format!(
                "{}/{}",
                self.current_question_index + 1,
                self.questions_amount
            ),
        }
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 == self.questions_amount
    }

    /// Starts a new round.
    pub fn reset_question_index(&mut self) {
        self.current_question_index = 0;
        self.correct_answers = 0;
    }

    pub fn switch_to_next_question(&mut self) {
        self.current_question_index += 1;
    }

    /// Returns whether `given` was right, counting it if so.
    pub fn record_answer(&mut self, given: bool, correct_answer: bool) -> bool {
        let is_correct = given == correct_answer;
        if is_correct {
            self.correct_answers += 1;
        }
        is_correct
    }

    /// Moves to the next question, or closes the round and stores it in `statistics`.
    pub fn advance(mut self, statistics: &StatisticService) -> Result<RoundStep, QuizError> {
        if !self.is_last_question() {
            self.switch_to_next_question();
            return Ok(RoundStep::Next(self));
        }

        statistics.store(self.correct_answers, self.questions_amount)?;
        Ok(RoundStep::Finished {
            round: self,
            results: self.results_view_model(statistics),
        })
    }

    pub fn results_view_model(&self, statistics: &StatisticService) -> QuizResultsViewModel {
        let text = format!(
            "Your result: {}/{}\n{}",
            self.correct_answers,
            self.questions_amount,
            statistics_summary(statistics)
        );

        QuizResultsViewModel {
            title: "This round is over!".to_string(),
            text,
            button_text: "Play again".to_string(),
        }
    }
}

/// Games played, record and accuracy, one per line.
pub fn statistics_summary(statistics: &StatisticService) -> String {
    let (best_correct, best_total, best_date) = match statistics.best_game() {
        Some(best) => (
            best.correct,
            best.total,
            best.date.format("%d.%m.%Y %H:%M").to_string(),
        ),
        None => (0, 0, NO_BEST_GAME_DATE.to_string()),
    };

    format!(
        "Quizzes played: {}\nRecord: {}/{} ({})\nAverage accuracy: {:.2}%",
        statistics.games_count(),
        best_correct,
        best_total,
        best_date,
        statistics.total_accuracy()
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::quiz::settings_store::MemoryStore;

    #[test]
    fn test_convert() {
        let mut presenter = MovieQuizPresenter::new(10);
        presenter.switch_to_next_question();
        let question = QuizQuestion::new(vec![1, 2, 3], "Question?".to_string(), true);

        let view = presenter.convert(&question);
        assert_eq!(view.image, vec![1, 2, 3]);
        assert_eq!(view.question, "Question?");
        assert_eq!(view.question_number, "2/10");
    }

    #[test]
    fn test_last_question_reported_once_per_round() {
        let mut presenter = MovieQuizPresenter::new(10);
        let mut last_at = Vec::new();
        for _ in 0..10 {
            if presenter.is_last_question() {
                last_at.push(presenter.current_question_index());
            } else {
                presenter.switch_to_next_question();
            }
        }
        assert_eq!(last_at, vec![9]);
    }

    #[test]
    fn test_record_answer_and_reset() {
        let mut presenter = MovieQuizPresenter::new(10);
        assert!(presenter.record_answer(true, true));
        assert!(!presenter.record_answer(true, false));
        assert!(presenter.record_answer(false, false));
        presenter.switch_to_next_question();
        assert_eq!(presenter.correct_answers(), 2);

        presenter.reset_question_index();
        assert_eq!(presenter.correct_answers(), 0);
        assert_eq!(presenter.current_question_index(), 0);
    }

    #[test]
    fn test_results_text() {
        let statistics = StatisticService::new(Arc::new(MemoryStore::new()), "1", 10);
        statistics.store(7, 10).unwrap();
        statistics.store(9, 10).unwrap();

        let mut presenter = MovieQuizPresenter::new(10);
        for _ in 0..9 {
            presenter.record_answer(true, true);
        }

        let results = statistics.best_game().unwrap();
        let view = presenter.results_view_model(&statistics);
        assert_eq!(view.button_text, "Play again");
        assert_eq!(
            view.text,
            format!(
                "Your result: 9/10\nQuizzes played: 2\nRecord: 9/10 ({})\nAverage accuracy: 80.00%",
                results.date.format("%d.%m.%Y %H:%M")
            )
        );
    }

    #[test]
    fn test_full_round_stores_once() {
        let statistics = StatisticService::new(Arc::new(MemoryStore::new()), "1", 10);
        let mut round = MovieQuizPresenter::new(10);
        let mut finished = Vec::new();

        for i in 0..10 {
            round.record_answer(i % 3 != 0, true);
            match round.advance(&statistics).unwrap() {
                RoundStep::Next(next) => {
                    assert_eq!(statistics.games_count(), 0);
                    round = next;
                }
                RoundStep::Finished { round, results } => finished.push((i, round, results)),
            }
        }

        assert_eq!(finished.len(), 1);
        let (answered_at, done, results) = &finished[0];
        assert_eq!(*answered_at, 9);
        assert_eq!(done.correct_answers(), 6);
        assert!(results.text.starts_with("Your result: 6/10\nQuizzes played: 1\n"));
        assert_eq!(statistics.games_count(), 1);
        assert_eq!(statistics.correct_answers(), 6);
        assert_eq!(statistics.best_game().unwrap().correct, 6);
    }

    #[test]
    fn test_play_again_after_finished_round() {
        let statistics = StatisticService::new(Arc::new(MemoryStore::new()), "1", 2);
        let mut round = MovieQuizPresenter::new(2);
        round.record_answer(true, true);
        round = match round.advance(&statistics).unwrap() {
            RoundStep::Next(next) => next,
            other => panic!("unexpected step: {:?}", other),
        };
        round.record_answer(true, true);
        let RoundStep::Finished { round: mut done, .. } = round.advance(&statistics).unwrap() else {
            panic!("round should be over");
        };

        done.reset_question_index();
        assert_eq!(done, MovieQuizPresenter::new(2));
        assert_eq!(statistics.games_count(), 1);
    }

    #[test]
    fn test_results_without_best_game() {
        let statistics = StatisticService::new(Arc::new(MemoryStore::new()), "1", 10);
        let view = MovieQuizPresenter::new(10).results_view_model(&statistics);
        assert!(view.text.contains("Record: 0/0 (no date yet)"));
        assert!(view.text.ends_with("Average accuracy: 0.00%"));
    }
}
