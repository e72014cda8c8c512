//! Create-record wizard.
//!
//! Every screen is rendered purely from the current draft, so Back buttons
//! simply re-render an earlier screen — there is no undo log to replay.

use super::Bot;
use super::action::{BackTarget, CallbackAction};
use super::state::{CreateDraft, Step};
use super::zone_keyboard;
use crate::dns::{RecordInput, RecordType};
use crate::error::DnsError;
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::validation::validate_record_name;

pub(crate) const TTL_CHOICES: [u32; 6] = [1, 300, 600, 1800, 3600, 86400];

impl Bot {
    /// Screen 1/6: zone selection. Entry point of the wizard.
    pub(crate) async fn create_start(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: Option<i64>,
    ) {
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

        let mut target = message_id;
        self.conversations.update(user_id, |state| {
            state.step = Step::SelectZone;
            if let Some(id) = message_id {
                state.create.message_id = Some(id);
            } else {
                target = state.create.message_id;
            }
        });

        let markup = zone_keyboard(
            &zones,
            CallbackAction::SelectZoneCreate,
            vec![InlineKeyboardButton::new(
                "❌ Cancel",
                CallbackAction::CancelCreate.encode(),
            )],
        );
        self.edit_or_send(
            chat_id,
            target,
            "*➕ Create DNS Record*\n\nStep 1/6: Select a zone:",
            Some(&markup),
        )
        .await;
    }

    pub(crate) async fn create_zone_selected(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: i64,
        zone: String,
    ) {
        self.conversations
            .update(user_id, |state| state.create.zone = Some(zone.clone()));
        self.show_create_screen(chat_id, user_id, Some(message_id), Step::SelectType, None)
            .await;
    }

    /// "Create" button on a zone's record list: the zone is already chosen.
    pub(crate) async fn create_in_zone(&self, chat_id: i64, user_id: i64, zone: String) {
        self.conversations.update(user_id, |state| {
            state.create = CreateDraft {
                zone: Some(zone.clone()),
                ..CreateDraft::default()
            };
            state.edit = None;
        });
        self.show_create_screen(chat_id, user_id, None, Step::SelectType, None)
            .await;
    }

    pub(crate) async fn create_type_selected(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: i64,
        record_type: RecordType,
    ) {
        self.conversations
            .update(user_id, |state| state.create.record_type = Some(record_type));
        self.show_create_screen(chat_id, user_id, Some(message_id), Step::InputName, None)
            .await;
    }

    pub(crate) async fn create_name_entered(&self, chat_id: i64, user_id: i64, text: &str) {
        if let Err(err) = validate_record_name(text) {
            self.show_create_screen(
                chat_id,
                user_id,
                None,
                Step::InputName,
                Some(&err.to_string()),
            )
            .await;
            return;
        }

        let name = text.trim().to_string();
        self.conversations
            .update(user_id, |state| state.create.name = Some(name.clone()));
        self.show_create_screen(chat_id, user_id, None, Step::InputContent, None)
            .await;
    }

    pub(crate) async fn create_content_entered(&self, chat_id: i64, user_id: i64, text: &str) {
        let content = text.trim();
        if content.is_empty() {
            self.show_create_screen(
                chat_id,
                user_id,
                None,
                Step::InputContent,
                Some("Content must not be empty."),
            )
            .await;
            return;
        }

        let content = content.to_string();
        self.conversations
            .update(user_id, |state| state.create.content = Some(content.clone()));
        self.show_create_screen(chat_id, user_id, None, Step::SelectTtl, None)
            .await;
    }

    pub(crate) async fn create_ttl_selected(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: i64,
        ttl: u32,
    ) {
        self.conversations
            .update(user_id, |state| state.create.ttl = Some(ttl));
        self.show_create_screen(chat_id, user_id, Some(message_id), Step::SelectProxied, None)
            .await;
    }

    /// Custom TTL typed instead of picking a preset. Invalid input re-prompts
    /// the same step instead of advancing.
    pub(crate) async fn create_ttl_entered(&self, chat_id: i64, user_id: i64, text: &str) {
        match text.trim().parse::<u32>() {
            Ok(ttl) => {
                self.conversations
                    .update(user_id, |state| state.create.ttl = Some(ttl));
                self.show_create_screen(chat_id, user_id, None, Step::SelectProxied, None)
                    .await;
            }
            Err(_) => {
                self.show_create_screen(
                    chat_id,
                    user_id,
                    None,
                    Step::SelectTtl,
                    Some("Invalid TTL. Send a whole number of seconds."),
                )
                .await;
            }
        }
    }

    pub(crate) async fn create_proxied_selected(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: i64,
        proxied: bool,
    ) {
        self.conversations
            .update(user_id, |state| state.create.proxied = Some(proxied));
        self.show_create_screen(chat_id, user_id, Some(message_id), Step::Confirm, None)
            .await;
    }

    /// Terminal transition: the one side-effecting call of the flow.
    pub(crate) async fn create_confirmed(&self, chat_id: i64, user_id: i64, message_id: i64) {
        let draft = self.conversations.get(user_id).create;

        let (Some(zone), Some(record_type), Some(name), Some(content), Some(ttl), Some(proxied)) = (
            draft.zone,
            draft.record_type,
            draft.name,
            draft.content,
            draft.ttl,
            draft.proxied,
        ) else {
            self.conversations.clear(user_id);
            self.edit_or_send(
                chat_id,
                Some(message_id),
                "⚠️ This wizard is no longer active. Start again from the menu.",
                Some(&menu_markup()),
            )
            .await;
            return;
        };

        let input = RecordInput {
            zone,
            name: name.clone(),
            record_type: record_type.as_str().to_string(),
            content,
            ttl,
            proxied,
            priority: None,
        };

        match self.dns.create_record(&input).await {
            Ok(record) => {
                self.conversations.clear(user_id);
                let markup = InlineKeyboardMarkup::new().row(vec![
                    InlineKeyboardButton::new("➕ Create Another", CallbackAction::Create.encode()),
                    InlineKeyboardButton::new("🏠 Main Menu", CallbackAction::Menu.encode()),
                ]);
                self.edit_or_send(
                    chat_id,
                    Some(message_id),
                    &format!(
                        "✅ *Record Created Successfully!*\n\nName: `{}`\nType: `{}`\nContent: `{}`\nTTL: `{}`\nProxied: `{}`",
                        record.name, record.record_type, record.content, record.ttl, record.proxied
                    ),
                    Some(&markup),
                )
                .await;
            }
            Err(DnsError::DuplicateRecord(_)) => {
                self.conversations.clear(user_id);
                let markup = InlineKeyboardMarkup::new().row(vec![
                    InlineKeyboardButton::new("🔍 Manage Records", CallbackAction::Manage.encode()),
                    InlineKeyboardButton::new("🏠 Main Menu", CallbackAction::Menu.encode()),
                ]);
                self.edit_or_send(
                    chat_id,
                    Some(message_id),
                    &format!(
                        "❌ Record `{name}` already exists. Use *Manage Records* to update it."
                    ),
                    Some(&markup),
                )
                .await;
            }
            Err(err) => {
                self.conversations.clear(user_id);
                self.edit_or_send(
                    chat_id,
                    Some(message_id),
                    &format!("❌ Error creating record: {err}"),
                    Some(&menu_markup()),
                )
                .await;
            }
        }
    }

    /// Re-render an earlier screen from the fields as currently stored.
    pub(crate) async fn back(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: i64,
        target: BackTarget,
    ) {
        match target {
            BackTarget::SelectZone => {
                self.create_start(chat_id, user_id, Some(message_id)).await
            }
            BackTarget::SelectType => {
                self.show_create_screen(chat_id, user_id, Some(message_id), Step::SelectType, None)
                    .await
            }
            BackTarget::InputName => {
                self.show_create_screen(chat_id, user_id, Some(message_id), Step::InputName, None)
                    .await
            }
            BackTarget::InputContent => {
                self.show_create_screen(
                    chat_id,
                    user_id,
                    Some(message_id),
                    Step::InputContent,
                    None,
                )
                .await
            }
            BackTarget::SelectTtl => {
                self.show_create_screen(chat_id, user_id, Some(message_id), Step::SelectTtl, None)
                    .await
            }
            BackTarget::RecordView => {
                let state = self.conversations.get(user_id);
                match state.edit {
                    Some(edit) => {
                        self.conversations.set_step(user_id, Step::None);
                        self.view_record(chat_id, message_id, &edit.zone, edit.page, edit.row)
                            .await;
                    }
                    None => self.show_main_menu(chat_id).await,
                }
            }
        }
    }

    /// Set the step and render its screen from the draft. `message_id` is
    /// remembered so text replies keep editing the wizard message in place.
    async fn show_create_screen(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: Option<i64>,
        step: Step,
        note: Option<&str>,
    ) {
        let mut target = message_id;
        self.conversations.update(user_id, |state| {
            state.step = step;
            if let Some(id) = message_id {
                state.create.message_id = Some(id);
            } else {
                target = state.create.message_id;
            }
        });

        let draft = self.conversations.get(user_id).create;
        let text = screen_text(step, &draft, note);
        let markup = screen_markup(step);
        self.edit_or_send(chat_id, target, &text, Some(&markup)).await;
    }
}

fn menu_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new().row(vec![InlineKeyboardButton::new(
        "🏠 Main Menu",
        CallbackAction::Menu.encode(),
    )])
}

fn back_cancel_row(target: BackTarget) -> Vec<InlineKeyboardButton> {
    vec![
        InlineKeyboardButton::new("◀️ Back", CallbackAction::Back(target).encode()),
        InlineKeyboardButton::new("❌ Cancel", CallbackAction::CancelCreate.encode()),
    ]
}

/// Prompt text for a wizard screen, rebuilt from the draft on every render.
fn screen_text(step: Step, draft: &CreateDraft, note: Option<&str>) -> String {
    let zone = draft.zone.as_deref().unwrap_or("?");
    let record_type = draft
        .record_type
        .map(|t| t.as_str())
        .unwrap_or("?");
    let name = draft.name.as_deref().unwrap_or("?");
    let content = draft.content.as_deref().unwrap_or("?");
    let ttl = draft.ttl.map_or_else(|| "?".to_string(), |t| t.to_string());
    let proxied = if draft.proxied.unwrap_or(false) { "Yes" } else { "No" };

    let body = match step {
        Step::SelectType => format!(
            "*➕ Create DNS Record*\n\nZone: `{zone}`\n\nStep 2/6: Select record type:"
        ),
        Step::InputName => format!(
            "*➕ Create DNS Record*\n\nZone: `{zone}`\nType: `{record_type}`\n\nStep 3/6: Enter the record name (e.g. `www`, `api`, `@` for root):"
        ),
        Step::InputContent => format!(
            "*➕ Create DNS Record*\n\nZone: `{zone}`\nType: `{record_type}`\nName: `{name}`\n\nStep 4/6: Enter the content (IP for A/AAAA, target host for CNAME, text for TXT):"
        ),
        Step::SelectTtl => format!(
            "*➕ Create DNS Record*\n\nZone: `{zone}`\nType: `{record_type}`\nName: `{name}`\nContent: `{content}`\n\nStep 5/6: Select TTL, or send a custom value in seconds:"
        ),
        Step::SelectProxied => format!(
            "*➕ Create DNS Record*\n\nZone: `{zone}`\nType: `{record_type}`\nName: `{name}`\nContent: `{content}`\nTTL: `{ttl}`\n\nStep 6/6: Route traffic through the Cloudflare proxy?"
        ),
        Step::Confirm => format!(
            "*➕ Create DNS Record - Confirm*\n\nZone: `{zone}`\nType: `{record_type}`\nName: `{name}`\nContent: `{content}`\nTTL: `{ttl}`\nProxied: `{proxied}`\n\nConfirm creation?"
        ),
        _ => String::new(),
    };

    match note {
        Some(note) => format!("❌ {note}\n\n{body}"),
        None => body,
    }
}

fn screen_markup(step: Step) -> InlineKeyboardMarkup {
    match step {
        Step::SelectType => {
            let mut markup = InlineKeyboardMarkup::new();
            for chunk in RecordType::ALL.chunks(4) {
                markup = markup.row(
                    chunk
                        .iter()
                        .map(|t| {
                            InlineKeyboardButton::new(
                                t.as_str(),
                                CallbackAction::SelectType(*t).encode(),
                            )
                        })
                        .collect(),
                );
            }
            markup.row(back_cancel_row(BackTarget::SelectZone))
        }
        Step::InputName => {
            InlineKeyboardMarkup::new().row(back_cancel_row(BackTarget::SelectType))
        }
        Step::InputContent => {
            InlineKeyboardMarkup::new().row(back_cancel_row(BackTarget::InputName))
        }
        Step::SelectTtl => {
            let mut markup = InlineKeyboardMarkup::new();
            for chunk in TTL_CHOICES.chunks(3) {
                markup = markup.row(
                    chunk
                        .iter()
                        .map(|ttl| {
                            let label = if *ttl == 1 {
                                "Auto (1)".to_string()
                            } else {
                                ttl.to_string()
                            };
                            InlineKeyboardButton::new(label, CallbackAction::SelectTtl(*ttl).encode())
                        })
                        .collect(),
                );
            }
            markup.row(back_cancel_row(BackTarget::InputContent))
        }
        Step::SelectProxied => InlineKeyboardMarkup::new()
            .row(vec![
                InlineKeyboardButton::new(
                    "✅ Yes (Proxied)",
                    CallbackAction::SelectProxied(true).encode(),
                ),
                InlineKeyboardButton::new(
                    "❌ No (DNS Only)",
                    CallbackAction::SelectProxied(false).encode(),
                ),
            ])
            .row(back_cancel_row(BackTarget::SelectTtl)),
        Step::Confirm => InlineKeyboardMarkup::new()
            .row(vec![InlineKeyboardButton::new(
                "✅ Confirm Create",
                CallbackAction::ConfirmCreate.encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "❌ Cancel",
                CallbackAction::CancelCreate.encode(),
            )]),
        _ => InlineKeyboardMarkup::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_through_content() -> CreateDraft {
        CreateDraft {
            zone: Some("example.com".into()),
            record_type: Some(RecordType::A),
            name: Some("www".into()),
            content: Some("192.168.1.1".into()),
            ttl: None,
            proxied: None,
            message_id: None,
        }
    }

    #[test]
    fn screens_render_accumulated_fields() {
        let draft = draft_through_content();
        let text = screen_text(Step::SelectTtl, &draft, None);
        assert!(text.contains("`example.com`"));
        assert!(text.contains("`A`"));
        assert!(text.contains("`www`"));
        assert!(text.contains("`192.168.1.1`"));
        assert!(text.contains("Step 5/6"));
    }

    #[test]
    fn forward_then_back_reproduces_the_prior_prompt() {
        let mut draft = draft_through_content();
        let ttl_screen_before = screen_text(Step::SelectTtl, &draft, None);

        // Advance: pick a TTL, land on the proxied screen...
        draft.ttl = Some(300);
        let _ = screen_text(Step::SelectProxied, &draft, None);

        // ...then go back. No field was lost, so the prompt is identical.
        let ttl_screen_after = screen_text(Step::SelectTtl, &draft, None);
        assert_eq!(ttl_screen_before, ttl_screen_after);
    }

    #[test]
    fn notes_are_prepended_without_replacing_the_prompt() {
        let draft = draft_through_content();
        let text = screen_text(Step::SelectTtl, &draft, Some("Invalid TTL."));
        assert!(text.starts_with("❌ Invalid TTL."));
        assert!(text.contains("Step 5/6"));
    }

    #[test]
    fn confirm_screen_shows_every_field() {
        let mut draft = draft_through_content();
        draft.ttl = Some(300);
        draft.proxied = Some(true);
        let text = screen_text(Step::Confirm, &draft, None);
        for needle in ["`example.com`", "`A`", "`www`", "`192.168.1.1`", "`300`", "`Yes`"] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn keyboards_match_their_screens() {
        let markup = screen_markup(Step::SelectType);
        // 8 types in rows of 4, plus the back/cancel row.
        assert_eq!(markup.inline_keyboard.len(), 3);
        assert_eq!(markup.inline_keyboard[0].len(), 4);

        let markup = screen_markup(Step::SelectTtl);
        assert_eq!(markup.inline_keyboard.len(), 3);
        assert_eq!(markup.inline_keyboard[0][0].text, "Auto (1)");
    }
}
