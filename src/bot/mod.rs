//! Telegram front-end: long-poll dispatcher, menus, and the record wizards.

pub mod action;
pub mod pagination;
pub mod state;

mod access;
mod create;
mod manage;
mod tokens;

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::dns::{DnsService, Zone};
use crate::store::ConfigStore;
use crate::telegram::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, TelegramClient, Update,
};

use action::CallbackAction;
use state::{ConversationStore, Step};

pub use access::AccessGate;
pub use state::spawn_expiry_sweep;

/// Long-poll timeout for getUpdates.
const POLL_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause after a failed getUpdates call before retrying.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct Bot {
    pub(crate) telegram: Arc<TelegramClient>,
    pub(crate) dns: Arc<DnsService>,
    pub(crate) store: Arc<ConfigStore>,
    pub(crate) conversations: Arc<ConversationStore>,
    pub(crate) gate: Arc<AccessGate>,
}

impl Bot {
    pub fn new(
        telegram: Arc<TelegramClient>,
        dns: Arc<DnsService>,
        store: Arc<ConfigStore>,
        gate: Arc<AccessGate>,
    ) -> Self {
        Self {
            telegram,
            dns,
            store,
            conversations: Arc::new(ConversationStore::new()),
            gate,
        }
    }

    pub fn conversations(&self) -> Arc<ConversationStore> {
        Arc::clone(&self.conversations)
    }

    /// Long-poll loop. Each update is handled on its own task so a slow
    /// backend call never stalls other users.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let me = self.telegram.get_me().await?;
        info!(
            "authorized as @{}",
            me.username.as_deref().unwrap_or("<unknown>")
        );
        self.notify_admins_on_startup().await;

        let mut offset = 0i64;
        loop {
            match self.telegram.get_updates(offset, POLL_TIMEOUT).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let bot = Arc::clone(&self);
                        tokio::spawn(async move { bot.handle_update(update).await });
                    }
                }
                Err(err) => {
                    warn!("getUpdates failed: {err:#}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn handle_update(&self, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(user) = message.from else { return };
        let chat_id = message.chat.id;
        let text = message.text.unwrap_or_default();
        debug!(user = user.id, chat = chat_id, "message: {text}");

        if !self.gate.is_allowed(user.id) {
            self.handle_unauthorized(chat_id, &user).await;
            return;
        }

        if text.starts_with("/start") {
            self.conversations.clear(user.id);
            self.show_main_menu(chat_id).await;
            return;
        }
        if text.starts_with("/requests") {
            self.show_pending_requests(chat_id).await;
            return;
        }

        // Free text only matters on input steps; anything else falls back to
        // the menu.
        match self.conversations.get(user.id).step {
            Step::InputName => self.create_name_entered(chat_id, user.id, &text).await,
            Step::InputContent => self.create_content_entered(chat_id, user.id, &text).await,
            Step::SelectTtl => self.create_ttl_entered(chat_id, user.id, &text).await,
            Step::EditContent => self.edit_content_entered(chat_id, user.id, text).await,
            Step::EditTtl => self.edit_ttl_entered(chat_id, user.id, &text).await,
            _ => self.show_main_menu(chat_id).await,
        }
    }

    async fn handle_callback(&self, callback: CallbackQuery) {
        if let Err(err) = self.telegram.answer_callback_query(&callback.id).await {
            debug!("answerCallbackQuery failed: {err:#}");
        }

        let user = callback.from;
        let Some(message) = callback.message else {
            return;
        };
        let chat_id = message.chat.id;
        let message_id = message.message_id;
        let data = callback.data.unwrap_or_default();
        debug!(user = user.id, "callback: {data}");

        let Some(action) = CallbackAction::parse(&data) else {
            warn!("unparseable callback payload: {data:?}");
            return;
        };

        if !self.gate.is_allowed(user.id) {
            // The one action an unlisted user may take is asking to be let in.
            if action == CallbackAction::RequestAccess {
                self.request_access(chat_id, &user).await;
            } else {
                self.handle_unauthorized(chat_id, &user).await;
            }
            return;
        }

        match action {
            CallbackAction::Menu => self.show_main_menu(chat_id).await,
            CallbackAction::Zones => self.show_zones(chat_id).await,
            CallbackAction::Create => {
                self.create_start(chat_id, user.id, Some(message_id)).await
            }
            CallbackAction::Manage => self.manage_start(chat_id).await,
            CallbackAction::SelectZoneCreate(zone) => {
                self.create_zone_selected(chat_id, user.id, message_id, zone)
                    .await
            }
            CallbackAction::SelectZoneManage(zone) => {
                self.show_records(chat_id, Some(message_id), &zone, 0).await
            }
            CallbackAction::CreateInZone(zone) => {
                self.create_in_zone(chat_id, user.id, zone).await
            }
            CallbackAction::SelectType(record_type) => {
                self.create_type_selected(chat_id, user.id, message_id, record_type)
                    .await
            }
            CallbackAction::SelectTtl(ttl) => {
                self.create_ttl_selected(chat_id, user.id, message_id, ttl)
                    .await
            }
            CallbackAction::SelectProxied(proxied) => {
                self.create_proxied_selected(chat_id, user.id, message_id, proxied)
                    .await
            }
            CallbackAction::ConfirmCreate => {
                self.create_confirmed(chat_id, user.id, message_id).await
            }
            CallbackAction::CancelCreate | CallbackAction::CancelEdit => {
                self.conversations.clear(user.id);
                self.show_main_menu(chat_id).await;
            }
            CallbackAction::Back(target) => {
                self.back(chat_id, user.id, message_id, target).await
            }
            CallbackAction::Page { zone, page } => {
                self.show_records(chat_id, Some(message_id), &zone, page)
                    .await
            }
            CallbackAction::Refresh { zone } => {
                self.show_records(chat_id, Some(message_id), &zone, 0).await
            }
            CallbackAction::ViewRecord { zone, page, row } => {
                self.view_record(chat_id, message_id, &zone, page, row).await
            }
            CallbackAction::EditRecord {
                zone,
                page,
                row,
                field,
            } => {
                self.edit_field_selected(chat_id, user.id, message_id, zone, page, row, field)
                    .await
            }
            CallbackAction::EditTtlChoice(ttl) => {
                self.apply_edit(chat_id, user.id, None, Some(ttl), None).await
            }
            CallbackAction::EditProxiedChoice(proxied) => {
                self.apply_edit(chat_id, user.id, None, None, Some(proxied))
                    .await
            }
            CallbackAction::DeleteRecord { zone, page, row } => {
                self.delete_record(chat_id, message_id, &zone, page, row)
                    .await
            }
            CallbackAction::RequestAccess => self.request_access(chat_id, &user).await,
            CallbackAction::ApproveRequest(user_id) => {
                self.approve_request(chat_id, user_id).await
            }
            CallbackAction::RejectRequest(user_id) => {
                self.reject_request(chat_id, user_id).await
            }
            CallbackAction::Tokens => self.show_tokens_menu(chat_id).await,
            CallbackAction::TokenGenerate => self.generate_api_token(chat_id).await,
            CallbackAction::TokenList => self.list_api_tokens(chat_id).await,
            CallbackAction::TokenDeleteMenu => self.token_delete_menu(chat_id).await,
            CallbackAction::TokenDelete(index) => self.delete_api_token(chat_id, index).await,
            CallbackAction::Noop => {}
        }
    }

    // Sending helpers. Failures at the UI boundary are logged and swallowed;
    // nothing above this layer retries chat delivery.

    pub(crate) async fn send(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) {
        if let Err(err) = self.telegram.send_message(chat_id, text, markup).await {
            error!("sendMessage failed: {err:#}");
        }
    }

    /// Edit `message_id` in place when known, otherwise send a new message.
    pub(crate) async fn edit_or_send(
        &self,
        chat_id: i64,
        message_id: Option<i64>,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) {
        match message_id {
            Some(id) => {
                if let Err(err) = self
                    .telegram
                    .edit_message_text(chat_id, id, text, markup)
                    .await
                {
                    debug!("editMessageText failed ({err:#}); sending a new message");
                    self.send(chat_id, text, markup).await;
                }
            }
            None => self.send(chat_id, text, markup).await,
        }
    }

    async fn notify_admins_on_startup(&self) {
        for admin in self.gate.admins() {
            self.send(admin, "🤖 *Bot Started*\n\nsuzume is online and ready.", None)
                .await;
        }
    }

    pub(crate) async fn show_main_menu(&self, chat_id: i64) {
        let markup = InlineKeyboardMarkup::new()
            .row(vec![
                InlineKeyboardButton::new("📋 Zones", CallbackAction::Zones.encode()),
                InlineKeyboardButton::new("➕ Create Record", CallbackAction::Create.encode()),
            ])
            .row(vec![InlineKeyboardButton::new(
                "🔍 Manage Records",
                CallbackAction::Manage.encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "🔑 API Tokens",
                CallbackAction::Tokens.encode(),
            )]);

        self.send(
            chat_id,
            "*🏠 Main Menu*\n\nWhat would you like to do?",
            Some(&markup),
        )
        .await;
    }

    async fn show_zones(&self, chat_id: i64) {
        let zones = match self.dns.list_zones().await {
            Ok(zones) => zones,
            Err(err) => {
                self.send(chat_id, &format!("❌ Error: {err}"), None).await;
                return;
            }
        };
        if zones.is_empty() {
            self.send(chat_id, "📭 No zones found.", None).await;
            return;
        }

        let mut text = String::from("*📋 Your Zones:*\n\n");
        for (i, zone) in zones.iter().enumerate() {
            let _ = writeln!(text, "{}. `{}`", i + 1, zone.name);
        }

        let markup = InlineKeyboardMarkup::new().row(vec![InlineKeyboardButton::new(
            "◀️ Back to Menu",
            CallbackAction::Menu.encode(),
        )]);
        self.send(chat_id, &text, Some(&markup)).await;
    }
}

/// Zone picker: two zones per row plus a trailing control row.
pub(crate) fn zone_keyboard(
    zones: &[Zone],
    action: fn(String) -> CallbackAction,
    trailing: Vec<InlineKeyboardButton>,
) -> InlineKeyboardMarkup {
    let mut markup = InlineKeyboardMarkup::new();
    for pair in zones.chunks(2) {
        markup = markup.row(
            pair.iter()
                .map(|zone| {
                    InlineKeyboardButton::new(zone.name.clone(), action(zone.name.clone()).encode())
                })
                .collect(),
        );
    }
    markup.row(trailing)
}
