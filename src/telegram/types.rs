//! Minimal Bot API wire types; only the fields this bot reads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: Vec<InlineKeyboardButton>) -> Self {
        self.inline_keyboard.push(buttons);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_parsing() {
        let json = r#"{
            "update_id": 42,
            "callback_query": {
                "id": "77",
                "from": {"id": 1001, "first_name": "Alice", "username": "alice"},
                "message": {"message_id": 5, "chat": {"id": 1001}, "text": "hi"},
                "data": "view:example.com:0:3"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        assert!(update.message.is_none());
        let callback = update.callback_query.unwrap();
        assert_eq!(callback.from.id, 1001);
        assert_eq!(callback.data.as_deref(), Some("view:example.com:0:3"));
        assert_eq!(callback.message.unwrap().chat.id, 1001);
    }

    #[test]
    fn markup_serializes_rows() {
        let markup = InlineKeyboardMarkup::new()
            .row(vec![InlineKeyboardButton::new("A", "a")])
            .row(vec![
                InlineKeyboardButton::new("B", "b"),
                InlineKeyboardButton::new("C", "c"),
            ]);
        let json = serde_json::to_value(&markup).unwrap();
        assert_eq!(json["inline_keyboard"][1][1]["callback_data"], "c");
    }
}
