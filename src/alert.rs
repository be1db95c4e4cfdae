use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};
use teloxide::RequestError;

/// A one-button message; whatever the user sends next counts as pressing the button.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertModel {
    pub title: String,
    pub message: String,
    pub button_text: String,
}

impl AlertModel {
    pub fn new(title: &str, message: impl Into<String>, button_text: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            button_text: button_text.to_string(),
        }
    }

    pub fn text(&self) -> String {
        format!("{}\n\n{}", self.title, self.message)
    }
}

pub async fn show_alert(bot: &Bot, chat_id: ChatId, model: &AlertModel) -> Result<(), RequestError> {
    let keyboard = KeyboardMarkup::new(vec![vec![KeyboardButton::new(model.button_text.clone())]]);
    bot.send_message(chat_id, model.text())
        .reply_markup(keyboard)
        .await?;
    Ok(())
}
