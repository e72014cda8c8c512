//! RPC API-token management from the chat UI.

use std::fmt::Write as _;

use super::Bot;
use super::action::CallbackAction;
use crate::auth::{generate_token, mask_token};
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

impl Bot {
    pub(crate) async fn show_tokens_menu(&self, chat_id: i64) {
        let markup = InlineKeyboardMarkup::new()
            .row(vec![InlineKeyboardButton::new(
                "➕ Generate New Token",
                CallbackAction::TokenGenerate.encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "📋 List Tokens",
                CallbackAction::TokenList.encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "🗑️ Delete Token",
                CallbackAction::TokenDeleteMenu.encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "◀️ Back to Menu",
                CallbackAction::Menu.encode(),
            )]);

        self.send(
            chat_id,
            "*🔑 API Token Management*\n\nManage bearer tokens for the RPC endpoint:",
            Some(&markup),
        )
        .await;
    }

    pub(crate) async fn generate_api_token(&self, chat_id: i64) {
        let token = generate_token();
        if let Err(err) = self.store.add_api_token(&token) {
            self.send(chat_id, &format!("❌ Error saving token: {err}"), None)
                .await;
            return;
        }

        let markup = InlineKeyboardMarkup::new()
            .row(vec![InlineKeyboardButton::new(
                "➕ Generate Another",
                CallbackAction::TokenGenerate.encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "📋 List Tokens",
                CallbackAction::TokenList.encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "◀️ Back",
                CallbackAction::Tokens.encode(),
            )]);

        self.send(
            chat_id,
            &format!(
                "✅ *API Token Generated!*\n\nToken: `{token}`\n\n⚠️ *Important:* Copy this token now. It will not be shown again in full."
            ),
            Some(&markup),
        )
        .await;
    }

    pub(crate) async fn list_api_tokens(&self, chat_id: i64) {
        let tokens = self.store.api_tokens();
        if tokens.is_empty() {
            let markup = empty_list_markup();
            self.send(chat_id, "📭 No API tokens found.", Some(&markup)).await;
            return;
        }

        let mut text = String::from("*🔑 API Tokens:*\n\n");
        for (i, token) in tokens.iter().enumerate() {
            let _ = writeln!(text, "{}. `{}`", i + 1, mask_token(token));
        }

        let markup = InlineKeyboardMarkup::new()
            .row(vec![
                InlineKeyboardButton::new(
                    "➕ Generate New",
                    CallbackAction::TokenGenerate.encode(),
                ),
                InlineKeyboardButton::new(
                    "🗑️ Delete Token",
                    CallbackAction::TokenDeleteMenu.encode(),
                ),
            ])
            .row(vec![InlineKeyboardButton::new(
                "◀️ Back",
                CallbackAction::Tokens.encode(),
            )]);
        self.send(chat_id, &text, Some(&markup)).await;
    }

    pub(crate) async fn token_delete_menu(&self, chat_id: i64) {
        let tokens = self.store.api_tokens();
        if tokens.is_empty() {
            let markup = empty_list_markup();
            self.send(chat_id, "📭 No API tokens to delete.", Some(&markup))
                .await;
            return;
        }

        let mut markup = InlineKeyboardMarkup::new();
        for (i, token) in tokens.iter().enumerate() {
            markup = markup.row(vec![InlineKeyboardButton::new(
                format!("🗑️ {}", mask_token(token)),
                CallbackAction::TokenDelete(i).encode(),
            )]);
        }
        let markup = markup.row(vec![InlineKeyboardButton::new(
            "◀️ Back",
            CallbackAction::Tokens.encode(),
        )]);

        self.send(
            chat_id,
            "*🗑️ Delete API Token*\n\nSelect a token to delete:",
            Some(&markup),
        )
        .await;
    }

    pub(crate) async fn delete_api_token(&self, chat_id: i64, index: usize) {
        match self.store.remove_api_token(index) {
            Ok(token) => {
                let markup = InlineKeyboardMarkup::new()
                    .row(vec![InlineKeyboardButton::new(
                        "📋 List Tokens",
                        CallbackAction::TokenList.encode(),
                    )])
                    .row(vec![InlineKeyboardButton::new(
                        "◀️ Back",
                        CallbackAction::Tokens.encode(),
                    )]);
                self.send(
                    chat_id,
                    &format!("✅ Token `{}` deleted.", mask_token(&token)),
                    Some(&markup),
                )
                .await;
            }
            Err(err) => {
                self.send(chat_id, &format!("❌ Error deleting token: {err}"), None)
                    .await;
            }
        }
    }
}

fn empty_list_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new()
        .row(vec![InlineKeyboardButton::new(
            "➕ Generate Token",
            CallbackAction::TokenGenerate.encode(),
        )])
        .row(vec![InlineKeyboardButton::new(
            "◀️ Back",
            CallbackAction::Tokens.encode(),
        )])
}
