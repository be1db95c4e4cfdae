mod alert;
mod config;
mod error;
mod quiz;

use std::sync::Arc;

use alert::{show_alert, AlertModel};
use async_trait::async_trait;
use config::Config;
use dotenv::dotenv;
use error::QuizError;
use log::{debug, info};
use quiz::{
    movies_loader::MoviesLoader,
    network::{NetworkClient, NetworkRouting},
    presenter::{statistics_summary, MovieQuizPresenter, RoundStep},
    question_factory::{DelegateResult, QuestionFactory, QuestionFactoryDelegate},
    settings_store::{JsonFileStore, MemoryStore, SettingsStore},
    statistics::StatisticService,
    QuizQuestion,
};
use teloxide::{
    dispatching::{
        dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
        UpdateHandler,
    },
    prelude::*,
    types::{ChatAction, InputFile, KeyboardButton, KeyboardMarkup, KeyboardRemove},
    utils::command::BotCommands,
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    LoadFailed,
    Asking {
        round: MovieQuizPresenter,
        correct_answer: bool,
    },
    ImageLoadFailed {
        round: MovieQuizPresenter,
    },
    RoundComplete {
        round: MovieQuizPresenter,
    },
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum Command {
    #[command(description = "start a new quiz.")]
    Start,
    #[command(description = "show your statistics.")]
    Stats,
    #[command(description = "display this text.")]
    Help,
}

/// Everything the handlers share across chats.
pub struct QuizServices {
    factory: QuestionFactory,
    settings: Arc<dyn SettingsStore>,
    config: Config,
}

impl QuizServices {
    fn new_round(&self) -> MovieQuizPresenter {
        MovieQuizPresenter::new(self.config.questions_per_round)
    }

    fn statistics_for(&self, chat_id: ChatId) -> StatisticService {
        StatisticService::new(
            self.settings.clone(),
            chat_id.0.to_string(),
            self.config.questions_per_round,
        )
    }
}

const IN_MEMORY_STATS: &str = ":memory:";

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting movie quiz bot...");

    let config = Config::from_env()?;
    let bot = Bot::from_env();

    info!("Opening dialogue storage at {}", config.dialogue_db);
    let storage: Arc<ErasedStorage<State>> = SqliteStorage::open(&config.dialogue_db, Json)
        .await?
        .erase();

    let settings: Arc<dyn SettingsStore> = if config.stats_file == IN_MEMORY_STATS {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::open(&config.stats_file)?)
    };

    let network_client: Arc<dyn NetworkRouting> = Arc::new(NetworkClient::new());
    let movies_loader = Arc::new(MoviesLoader::new(
        network_client.clone(),
        config.movies_api_url.clone(),
    ));
    let factory = QuestionFactory::new(
        movies_loader,
        network_client,
        config.rating_thresholds.clone(),
    );

    let services = Arc::new(QuizServices {
        factory,
        settings,
        config,
    });

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![storage, services])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(dptree::entry().filter_command::<Command>().endpoint(command))
        .branch(dptree::case![State::Start].endpoint(start))
        .branch(dptree::case![State::LoadFailed].endpoint(retry_load))
        .branch(
            dptree::case![State::Asking {
                round,
                correct_answer
            }]
            .endpoint(receive_answer),
        )
        .branch(dptree::case![State::ImageLoadFailed { round }].endpoint(retry_question))
        .branch(dptree::case![State::RoundComplete { round }].endpoint(play_again))
}

const GREETING_TEXT: &str = "Hi! Let's see how well you know the top rated movies. I'll show a poster, you tell me whether its rating beats the threshold.";
const LOADING_TEXT: &str = "Loading movies...";
const YES_TEXT: &str = "Yes";
const NO_TEXT: &str = "No";
const CORRECT_TEXT: &str = "Correct!";
const WRONG_TEXT: &str = "Wrong!";
const ANSWER_PROMPT_TEXT: &str = "Please answer Yes or No";
const ERROR_TITLE: &str = "Error";
const TRY_AGAIN_TEXT: &str = "Try again";
const IMAGE_LOAD_ERROR_TEXT: &str = "Failed to load the movie poster.";

fn answer_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(NO_TEXT),
        KeyboardButton::new(YES_TEXT),
    ]])
}

fn parse_answer(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "yes" | "y" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

async fn command(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
    msg: Message,
    cmd: Command,
) -> HandlerResult {
    match cmd {
        Command::Start => start(bot, dialogue, services, msg).await,
        Command::Stats => {
            let statistics = services.statistics_for(msg.chat.id);
            bot.send_message(msg.chat.id, statistics_summary(&statistics))
                .await?;
            Ok(())
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
    }
}

async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
    msg: Message,
) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;
    load_movies(bot, dialogue, services).await
}

async fn retry_load(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
) -> HandlerResult {
    load_movies(bot, dialogue, services).await
}

async fn load_movies(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
) -> HandlerResult {
    bot.send_message(dialogue.chat_id(), LOADING_TEXT)
        .reply_markup(KeyboardRemove::new())
        .await?;
    if let Err(e) = bot
        .send_chat_action(dialogue.chat_id(), ChatAction::Typing)
        .await
    {
        debug!("send_chat_action failed: {}", e);
    }

    let round = services.new_round();
    let delegate = ChatDelegate::new(bot, dialogue, services.clone(), round);
    services.factory.load_data(&delegate).await
}

async fn request_question(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
    round: MovieQuizPresenter,
) -> HandlerResult {
    if let Err(e) = bot
        .send_chat_action(dialogue.chat_id(), ChatAction::UploadPhoto)
        .await
    {
        debug!("send_chat_action failed: {}", e);
    }

    let delegate = ChatDelegate::new(bot, dialogue, services.clone(), round);
    services.factory.request_next_question(&delegate).await
}

async fn receive_answer(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
    (round, correct_answer): (MovieQuizPresenter, bool),
    msg: Message,
) -> HandlerResult {
    let Some(given_answer) = msg.text().and_then(parse_answer) else {
        bot.send_message(msg.chat.id, ANSWER_PROMPT_TEXT)
            .reply_markup(answer_keyboard())
            .await?;
        return Ok(());
    };

    let mut round = round;
    let is_correct = round.record_answer(given_answer, correct_answer);
    debug!(
        "chat {}: question {} answered {}",
        msg.chat.id.0,
        round.current_question_index() + 1,
        if is_correct { "correctly" } else { "wrong" }
    );

    // Dropping the keyboard keeps the buttons out of reach until the next question.
    bot.send_message(msg.chat.id, if is_correct { CORRECT_TEXT } else { WRONG_TEXT })
        .reply_markup(KeyboardRemove::new())
        .await?;

    tokio::time::sleep(services.config.answer_delay).await;
    show_next_question_or_results(bot, dialogue, services, round).await
}

async fn show_next_question_or_results(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
    round: MovieQuizPresenter,
) -> HandlerResult {
    // Stats go to a file; keep that off the runtime workers.
    let statistics = services.statistics_for(dialogue.chat_id());
    let step = tokio::task::spawn_blocking(move || round.advance(&statistics)).await??;

    let (round, results) = match step {
        RoundStep::Next(round) => return request_question(bot, dialogue, services, round).await,
        RoundStep::Finished { round, results } => (round, results),
    };

    // The round is stored; leave `Asking` before any Telegram call can fail.
    dialogue.update(State::RoundComplete { round }).await?;
    info!(
        "chat {}: round finished with {}/{}",
        dialogue.chat_id().0,
        round.correct_answers(),
        round.questions_amount
    );

    show_alert(
        &bot,
        dialogue.chat_id(),
        &AlertModel::new(&results.title, results.text, &results.button_text),
    )
    .await?;
    Ok(())
}

async fn retry_question(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
    round: MovieQuizPresenter,
) -> HandlerResult {
    request_question(bot, dialogue, services, round).await
}

async fn play_again(
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
    round: MovieQuizPresenter,
) -> HandlerResult {
    let mut round = round;
    round.reset_question_index();
    request_question(bot, dialogue, services, round).await
}

/// Renders factory events into one chat.
struct ChatDelegate {
    bot: Bot,
    dialogue: QuizDialogue,
    services: Arc<QuizServices>,
    round: MovieQuizPresenter,
}

impl ChatDelegate {
    fn new(
        bot: Bot,
        dialogue: QuizDialogue,
        services: Arc<QuizServices>,
        round: MovieQuizPresenter,
    ) -> Self {
        Self {
            bot,
            dialogue,
            services,
            round,
        }
    }
}

#[async_trait]
impl QuestionFactoryDelegate for ChatDelegate {
    async fn did_load_data_from_server(&self) -> DelegateResult {
        debug!(
            "chat {}: catalog ready with {} movies",
            self.dialogue.chat_id().0,
            self.services.factory.movies_count()
        );
        self.services.factory.request_next_question(self).await
    }

    async fn did_fail_to_load_data(&self, error: QuizError) -> DelegateResult {
        let model = AlertModel::new(ERROR_TITLE, error.to_string(), TRY_AGAIN_TEXT);
        show_alert(&self.bot, self.dialogue.chat_id(), &model).await?;
        self.dialogue.update(State::LoadFailed).await?;
        Ok(())
    }

    async fn did_receive_next_question(&self, question: QuizQuestion) -> DelegateResult {
        let step = self.round.convert(&question);
        self.bot
            .send_photo(self.dialogue.chat_id(), InputFile::memory(step.image))
            .caption(format!("{}\n\n{}", step.question, step.question_number))
            .reply_markup(answer_keyboard())
            .await?;

        self.dialogue
            .update(State::Asking {
                round: self.round,
                correct_answer: question.correct_answer,
            })
            .await?;
        Ok(())
    }

    async fn did_fail_to_load_image(&self, _error: QuizError) -> DelegateResult {
        let model = AlertModel::new(ERROR_TITLE, IMAGE_LOAD_ERROR_TEXT, TRY_AGAIN_TEXT);
        show_alert(&self.bot, self.dialogue.chat_id(), &model).await?;
        self.dialogue
            .update(State::ImageLoadFailed { round: self.round })
            .await?;
        Ok(())
    }
}
