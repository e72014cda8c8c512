//! Record browsing and the single-field edit flow.
//!
//! Buttons never carry backend record IDs. A row is addressed by
//! `(zone, page, row)`; every click re-lists the zone and indexes into the
//! live listing, so a list that shrank since the render surfaces a
//! user-visible "not found" instead of acting on the wrong record.

use super::Bot;
use super::action::{BackTarget, CallbackAction, EditField};
use super::create::TTL_CHOICES;
use super::pagination::{self, PAGE_SIZE};
use super::state::{CreateDraft, EditDraft, Step};
use super::zone_keyboard;
use crate::dns::{DnsRecord, RecordInput};
use crate::error::DnsError;
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

impl Bot {
    pub(crate) async fn manage_start(&self, chat_id: i64) {
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

        let markup = zone_keyboard(
            &zones,
            CallbackAction::SelectZoneManage,
            vec![InlineKeyboardButton::new(
                "◀️ Back to Menu",
                CallbackAction::Menu.encode(),
            )],
        );
        self.send(
            chat_id,
            "*🔍 Manage Records*\n\nSelect a zone:",
            Some(&markup),
        )
        .await;
    }

    /// Paginated record list for a zone, re-fetched on every render.
    pub(crate) async fn show_records(
        &self,
        chat_id: i64,
        message_id: Option<i64>,
        zone: &str,
        page: usize,
    ) {
        let records = match self.dns.list_records(zone).await {
            Ok(records) => records,
            Err(err) => {
                self.edit_or_send(
                    chat_id,
                    message_id,
                    &format!("❌ Error loading records: {err}"),
                    None,
                )
                .await;
                return;
            }
        };

        if records.is_empty() {
            let markup = InlineKeyboardMarkup::new().row(vec![
                InlineKeyboardButton::new(
                    "➕ Create Record",
                    CallbackAction::CreateInZone(zone.to_string()).encode(),
                ),
                InlineKeyboardButton::new("◀️ Back", CallbackAction::Manage.encode()),
            ]);
            self.edit_or_send(
                chat_id,
                message_id,
                &format!("📭 No records found in `{zone}`."),
                Some(&markup),
            )
            .await;
            return;
        }

        let page = pagination::paginate(&records, page);
        let text = format!(
            "*🔍 Records in {zone}*\nPage {}/{} ({} records)\n\nSelect a record to view details:",
            page.page + 1,
            page.total_pages,
            page.total
        );

        let mut markup = InlineKeyboardMarkup::new();
        for (row, record) in page.items.iter().enumerate() {
            // Row buttons carry the clamped page, so a click stays coherent
            // even when the caller asked for a page that no longer exists.
            markup = markup.row(vec![InlineKeyboardButton::new(
                format!("📄 {} ({})", record.name, record.record_type),
                CallbackAction::ViewRecord {
                    zone: zone.to_string(),
                    page: page.page,
                    row,
                }
                .encode(),
            )]);
        }

        let mut nav = Vec::new();
        if page.has_prev() {
            nav.push(InlineKeyboardButton::new(
                "⬅️ Prev",
                CallbackAction::Page {
                    zone: zone.to_string(),
                    page: page.page - 1,
                }
                .encode(),
            ));
        }
        nav.push(InlineKeyboardButton::new(
            format!("📄 {}/{}", page.page + 1, page.total_pages),
            CallbackAction::Noop.encode(),
        ));
        if page.has_next() {
            nav.push(InlineKeyboardButton::new(
                "Next ➡️",
                CallbackAction::Page {
                    zone: zone.to_string(),
                    page: page.page + 1,
                }
                .encode(),
            ));
        }
        markup = markup
            .row(nav)
            .row(vec![
                InlineKeyboardButton::new(
                    "🔄 Refresh",
                    CallbackAction::Refresh {
                        zone: zone.to_string(),
                    }
                    .encode(),
                ),
                InlineKeyboardButton::new(
                    "➕ Create",
                    CallbackAction::CreateInZone(zone.to_string()).encode(),
                ),
            ])
            .row(vec![
                InlineKeyboardButton::new("◀️ Back", CallbackAction::Manage.encode()),
                InlineKeyboardButton::new("🏠 Menu", CallbackAction::Menu.encode()),
            ]);

        self.edit_or_send(chat_id, message_id, &text, Some(&markup))
            .await;
    }

    /// Resolve a `(zone, page, row)` address against the live listing.
    pub(crate) async fn record_at(
        &self,
        zone: &str,
        page: usize,
        row: usize,
    ) -> Result<DnsRecord, DnsError> {
        let records = self.dns.list_records(zone).await?;
        let index = page * PAGE_SIZE + row;
        records
            .into_iter()
            .nth(index)
            .ok_or_else(|| DnsError::RecordNotFound(format!("{zone} (page {page}, row {row})")))
    }

    pub(crate) async fn view_record(
        &self,
        chat_id: i64,
        message_id: i64,
        zone: &str,
        page: usize,
        row: usize,
    ) {
        let record = match self.record_at(zone, page, row).await {
            Ok(record) => record,
            Err(err) => {
                self.show_address_miss(chat_id, message_id, zone, page, err)
                    .await;
                return;
            }
        };

        let address = |field| CallbackAction::EditRecord {
            zone: zone.to_string(),
            page,
            row,
            field,
        };
        let markup = InlineKeyboardMarkup::new()
            .row(vec![
                InlineKeyboardButton::new("✏️ Edit Content", address(EditField::Content).encode()),
                InlineKeyboardButton::new("✏️ Edit TTL", address(EditField::Ttl).encode()),
            ])
            .row(vec![
                InlineKeyboardButton::new("🔀 Edit Proxied", address(EditField::Proxied).encode()),
                InlineKeyboardButton::new(
                    "🗑️ Delete",
                    CallbackAction::DeleteRecord {
                        zone: zone.to_string(),
                        page,
                        row,
                    }
                    .encode(),
                ),
            ])
            .row(vec![InlineKeyboardButton::new(
                "◀️ Back to List",
                CallbackAction::Page {
                    zone: zone.to_string(),
                    page,
                }
                .encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "🏠 Main Menu",
                CallbackAction::Menu.encode(),
            )]);

        let proxied = if record.proxied { "✅ Yes" } else { "❌ No" };
        let mut text = format!(
            "*📄 Record Details*\n\nZone: `{zone}`\nName: `{}`\nType: `{}`\nContent: `{}`\nTTL: `{}`\nProxied: `{proxied}`",
            record.name, record.record_type, record.content, record.ttl
        );
        if let Some(priority) = record.priority {
            text.push_str(&format!("\nPriority: `{priority}`"));
        }
        text.push_str(&format!("\nRecord ID: `{}`", record.id));

        self.edit_or_send(chat_id, Some(message_id), &text, Some(&markup))
            .await;
    }

    /// The user picked one field to change. The fresh record supplies the
    /// prompt's "current value"; everything else is re-read again at apply
    /// time.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn edit_field_selected(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: i64,
        zone: String,
        page: usize,
        row: usize,
        field: EditField,
    ) {
        let record = match self.record_at(&zone, page, row).await {
            Ok(record) => record,
            Err(err) => {
                self.show_address_miss(chat_id, message_id, &zone, page, err)
                    .await;
                return;
            }
        };

        self.conversations.update(user_id, |state| {
            state.create = CreateDraft::default();
            state.edit = Some(EditDraft {
                zone: zone.clone(),
                page,
                row,
                field,
                message_id: Some(message_id),
            });
            state.step = match field {
                EditField::Content => Step::EditContent,
                EditField::Ttl => Step::EditTtl,
                EditField::Proxied => Step::EditProxied,
            };
        });

        let header = format!(
            "*✏️ Edit DNS Record*\n\nZone: `{zone}`\nName: `{}`\nType: `{}`",
            record.name, record.record_type
        );
        let back_cancel = vec![
            InlineKeyboardButton::new(
                "◀️ Back",
                CallbackAction::Back(BackTarget::RecordView).encode(),
            ),
            InlineKeyboardButton::new("❌ Cancel", CallbackAction::CancelEdit.encode()),
        ];

        match field {
            EditField::Content => {
                let markup = InlineKeyboardMarkup::new().row(back_cancel);
                self.edit_or_send(
                    chat_id,
                    Some(message_id),
                    &format!(
                        "{header}\nCurrent Content: `{}`\n\nSend the new content:",
                        record.content
                    ),
                    Some(&markup),
                )
                .await;
            }
            EditField::Ttl => {
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
                                InlineKeyboardButton::new(
                                    label,
                                    CallbackAction::EditTtlChoice(*ttl).encode(),
                                )
                            })
                            .collect(),
                    );
                }
                let markup = markup.row(back_cancel);
                self.edit_or_send(
                    chat_id,
                    Some(message_id),
                    &format!(
                        "{header}\nCurrent TTL: `{}`\n\nSelect the new TTL, or send a custom value in seconds:",
                        record.ttl
                    ),
                    Some(&markup),
                )
                .await;
            }
            EditField::Proxied => {
                let markup = InlineKeyboardMarkup::new()
                    .row(vec![
                        InlineKeyboardButton::new(
                            "✅ Yes (Proxied)",
                            CallbackAction::EditProxiedChoice(true).encode(),
                        ),
                        InlineKeyboardButton::new(
                            "❌ No (DNS Only)",
                            CallbackAction::EditProxiedChoice(false).encode(),
                        ),
                    ])
                    .row(back_cancel);
                let current = if record.proxied { "Yes" } else { "No" };
                self.edit_or_send(
                    chat_id,
                    Some(message_id),
                    &format!("{header}\nCurrently Proxied: `{current}`\n\nRoute traffic through the Cloudflare proxy?"),
                    Some(&markup),
                )
                .await;
            }
        }
    }

    pub(crate) async fn edit_content_entered(&self, chat_id: i64, user_id: i64, text: String) {
        let content = text.trim();
        if content.is_empty() {
            self.send(chat_id, "❌ Content must not be empty. Send the new content:", None)
                .await;
            return;
        }
        self.apply_edit(chat_id, user_id, Some(content.to_string()), None, None)
            .await;
    }

    pub(crate) async fn edit_ttl_entered(&self, chat_id: i64, user_id: i64, text: &str) {
        match text.trim().parse::<u32>() {
            Ok(ttl) => self.apply_edit(chat_id, user_id, None, Some(ttl), None).await,
            Err(_) => {
                self.send(
                    chat_id,
                    "❌ Invalid TTL. Send a whole number of seconds:",
                    None,
                )
                .await;
            }
        }
    }

    /// Apply the single changed field: re-fetch the record at its address,
    /// keep the untouched fields from that fresh copy, and issue one
    /// full-record update.
    pub(crate) async fn apply_edit(
        &self,
        chat_id: i64,
        user_id: i64,
        new_content: Option<String>,
        new_ttl: Option<u32>,
        new_proxied: Option<bool>,
    ) {
        let Some(edit) = self.conversations.get(user_id).edit else {
            self.show_main_menu(chat_id).await;
            return;
        };

        let record = match self.record_at(&edit.zone, edit.page, edit.row).await {
            Ok(record) => record,
            Err(err) => {
                self.conversations.clear(user_id);
                self.edit_or_send(
                    chat_id,
                    edit.message_id,
                    &format!("❌ {err}\n\nThe record list may have changed; reload and try again."),
                    Some(&back_to_zone_markup(&edit.zone)),
                )
                .await;
                return;
            }
        };

        let input = RecordInput {
            zone: edit.zone.clone(),
            name: record.name.clone(),
            record_type: record.record_type.as_str().to_string(),
            content: new_content.unwrap_or_else(|| record.content.clone()),
            ttl: new_ttl.unwrap_or(record.ttl),
            proxied: new_proxied.unwrap_or(record.proxied),
            priority: record.priority,
        };

        match self.dns.update_record(&input).await {
            Ok(updated) => {
                self.conversations.clear(user_id);
                let markup = InlineKeyboardMarkup::new()
                    .row(vec![InlineKeyboardButton::new(
                        "◀️ Back to List",
                        CallbackAction::Page {
                            zone: edit.zone.clone(),
                            page: edit.page,
                        }
                        .encode(),
                    )])
                    .row(vec![InlineKeyboardButton::new(
                        "🏠 Main Menu",
                        CallbackAction::Menu.encode(),
                    )]);
                self.edit_or_send(
                    chat_id,
                    edit.message_id,
                    &format!(
                        "✅ *Record Updated Successfully!*\n\nZone: `{}`\nName: `{}`\nType: `{}`\nContent: `{}`\nTTL: `{}`\nProxied: `{}`",
                        edit.zone,
                        updated.name,
                        updated.record_type,
                        updated.content,
                        updated.ttl,
                        updated.proxied
                    ),
                    Some(&markup),
                )
                .await;
            }
            Err(err) => {
                self.conversations.clear(user_id);
                self.edit_or_send(
                    chat_id,
                    edit.message_id,
                    &format!("❌ Error updating record: {err}"),
                    Some(&back_to_zone_markup(&edit.zone)),
                )
                .await;
            }
        }
    }

    pub(crate) async fn delete_record(
        &self,
        chat_id: i64,
        message_id: i64,
        zone: &str,
        page: usize,
        row: usize,
    ) {
        let record = match self.record_at(zone, page, row).await {
            Ok(record) => record,
            Err(err) => {
                self.show_address_miss(chat_id, message_id, zone, page, err)
                    .await;
                return;
            }
        };

        match self.dns.delete_record(zone, &record.name).await {
            Ok(()) => {
                let markup = InlineKeyboardMarkup::new()
                    .row(vec![InlineKeyboardButton::new(
                        "◀️ Back to List",
                        CallbackAction::Page {
                            zone: zone.to_string(),
                            page,
                        }
                        .encode(),
                    )])
                    .row(vec![InlineKeyboardButton::new(
                        "🏠 Main Menu",
                        CallbackAction::Menu.encode(),
                    )]);
                self.edit_or_send(
                    chat_id,
                    Some(message_id),
                    &format!(
                        "✅ *Record Deleted*\n\nName: `{}`\nType: `{}`\nContent: `{}`",
                        record.name, record.record_type, record.content
                    ),
                    Some(&markup),
                )
                .await;
            }
            Err(err) => {
                self.edit_or_send(
                    chat_id,
                    Some(message_id),
                    &format!("❌ Error deleting record: {err}"),
                    Some(&back_to_zone_markup(zone)),
                )
                .await;
            }
        }
    }

    /// A stale address (the listing shrank between render and click) aborts
    /// back to the list rather than crashing or acting on the wrong row.
    async fn show_address_miss(
        &self,
        chat_id: i64,
        message_id: i64,
        zone: &str,
        page: usize,
        err: DnsError,
    ) {
        let markup = InlineKeyboardMarkup::new()
            .row(vec![InlineKeyboardButton::new(
                "◀️ Back to List",
                CallbackAction::Page {
                    zone: zone.to_string(),
                    page,
                }
                .encode(),
            )])
            .row(vec![InlineKeyboardButton::new(
                "🏠 Main Menu",
                CallbackAction::Menu.encode(),
            )]);
        self.edit_or_send(chat_id, Some(message_id), &format!("❌ {err}"), Some(&markup))
            .await;
    }
}

fn back_to_zone_markup(zone: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new()
        .row(vec![InlineKeyboardButton::new(
            "◀️ Back to List",
            CallbackAction::Page {
                zone: zone.to_string(),
                page: 0,
            }
            .encode(),
        )])
        .row(vec![InlineKeyboardButton::new(
            "🏠 Main Menu",
            CallbackAction::Menu.encode(),
        )])
}
