//! Access gate: static allow-list plus the request/approve/reject sub-flow.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::error;

use super::Bot;
use super::action::CallbackAction;
use crate::store::{ConfigStore, PendingRequest, merged_allow_list};
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup, User};

/// Holds the authorized user set explicitly — nothing ambient. Seeded from
/// the CLI allow-list plus the persisted store; grants persist through the
/// store.
pub struct AccessGate {
    allowed: RwLock<HashSet<i64>>,
    store: Arc<ConfigStore>,
}

impl AccessGate {
    pub fn new(seed: &[i64], store: Arc<ConfigStore>) -> Self {
        let allowed = merged_allow_list(seed, &store);
        Self {
            allowed: RwLock::new(allowed),
            store,
        }
    }

    /// An empty allow-list means the bot is open to everyone.
    pub fn is_allowed(&self, user_id: i64) -> bool {
        let allowed = self.read();
        allowed.is_empty() || allowed.contains(&user_id)
    }

    pub fn admins(&self) -> Vec<i64> {
        self.read().iter().copied().collect()
    }

    pub fn grant(&self, user_id: i64) -> anyhow::Result<()> {
        self.allowed
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user_id);
        self.store.add_allowed_user(user_id)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashSet<i64>> {
        self.allowed.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Bot {
    pub(crate) async fn handle_unauthorized(&self, chat_id: i64, user: &User) {
        if self.store.is_pending(user.id) {
            self.send(
                chat_id,
                "⏳ Your access request is pending approval. Please wait for an admin to review it.",
                None,
            )
            .await;
            return;
        }

        let markup = InlineKeyboardMarkup::new().row(vec![InlineKeyboardButton::new(
            "📝 Request Access",
            CallbackAction::RequestAccess.encode(),
        )]);
        self.send(
            chat_id,
            "⛔ *Access Denied*\n\nYou are not authorized to use this bot. Would you like to request access?",
            Some(&markup),
        )
        .await;
    }

    pub(crate) async fn request_access(&self, chat_id: i64, user: &User) {
        if self.store.is_pending(user.id) {
            self.send(chat_id, "⏳ Your request is already pending approval.", None)
                .await;
            return;
        }

        let request = PendingRequest {
            user_id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            requested_at: Utc::now(),
        };

        if let Err(err) = self.store.add_pending_request(request.clone()) {
            error!("failed to persist access request: {err:#}");
            self.send(chat_id, &format!("❌ Error submitting request: {err}"), None)
                .await;
            return;
        }

        self.notify_admins_of_request(&request).await;
        self.send(
            chat_id,
            "✅ Your access request has been submitted. You will be notified when it is reviewed.",
            None,
        )
        .await;
    }

    async fn notify_admins_of_request(&self, request: &PendingRequest) {
        let text = format!(
            "📝 *New Access Request*\n\n{}\n\nPlease review this request:",
            describe_requester(request)
        );
        let markup = review_markup(request.user_id);

        for admin in self.gate.admins() {
            self.send(admin, &text, Some(&markup)).await;
        }
    }

    pub(crate) async fn approve_request(&self, chat_id: i64, user_id: i64) {
        match self.store.remove_pending_request(user_id) {
            Ok(true) => {}
            Ok(false) => {
                self.send(chat_id, &format!("⚠️ No pending request for `{user_id}`."), None)
                    .await;
                return;
            }
            Err(err) => {
                self.send(chat_id, &format!("❌ Error removing request: {err}"), None)
                    .await;
                return;
            }
        }

        if let Err(err) = self.gate.grant(user_id) {
            error!("failed to persist grant for {user_id}: {err:#}");
            self.send(chat_id, &format!("❌ Error saving approval: {err}"), None)
                .await;
            return;
        }

        self.send(
            user_id,
            "✅ *Access Approved*\n\nYour access request has been approved. You can now use the bot.",
            None,
        )
        .await;
        self.send(chat_id, &format!("✅ User `{user_id}` has been approved."), None)
            .await;
    }

    pub(crate) async fn reject_request(&self, chat_id: i64, user_id: i64) {
        match self.store.remove_pending_request(user_id) {
            Ok(true) => {}
            Ok(false) => {
                self.send(chat_id, &format!("⚠️ No pending request for `{user_id}`."), None)
                    .await;
                return;
            }
            Err(err) => {
                self.send(chat_id, &format!("❌ Error removing request: {err}"), None)
                    .await;
                return;
            }
        }

        self.send(
            user_id,
            "❌ *Access Denied*\n\nYour access request has been rejected.",
            None,
        )
        .await;
        self.send(chat_id, &format!("❌ User `{user_id}` has been rejected."), None)
            .await;
    }

    pub(crate) async fn show_pending_requests(&self, chat_id: i64) {
        let requests = self.store.pending_requests();
        if requests.is_empty() {
            self.send(chat_id, "📭 No pending access requests.", None).await;
            return;
        }

        for request in requests {
            let text = format!(
                "📝 *Pending Access Request*\n\n{}\n\nPlease review this request:",
                describe_requester(&request)
            );
            self.send(chat_id, &text, Some(&review_markup(request.user_id)))
                .await;
        }
    }
}

fn review_markup(user_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new().row(vec![
        InlineKeyboardButton::new("✅ Approve", CallbackAction::ApproveRequest(user_id).encode()),
        InlineKeyboardButton::new("❌ Reject", CallbackAction::RejectRequest(user_id).encode()),
    ])
}

fn describe_requester(request: &PendingRequest) -> String {
    let mut text = format!("User ID: `{}`", request.user_id);
    if let Some(username) = &request.username {
        let _ = write!(text, "\nUsername: @{username}");
    }
    let name = [request.first_name.as_deref(), request.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if !name.is_empty() {
        let _ = write!(text, "\nName: {name}");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gate(seed: &[i64]) -> (TempDir, AccessGate) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ConfigStore::open(dir.path()).unwrap());
        (dir, AccessGate::new(seed, store))
    }

    #[test]
    fn empty_allow_list_is_open_access() {
        let (_dir, gate) = gate(&[]);
        assert!(gate.is_allowed(12345));
    }

    #[test]
    fn listed_users_only_once_seeded() {
        let (_dir, gate) = gate(&[1, 2]);
        assert!(gate.is_allowed(1));
        assert!(!gate.is_allowed(3));
    }

    #[test]
    fn grants_take_effect_and_persist() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ConfigStore::open(dir.path()).unwrap());
        let gate = AccessGate::new(&[1], Arc::clone(&store));

        assert!(!gate.is_allowed(9));
        gate.grant(9).unwrap();
        assert!(gate.is_allowed(9));

        // A gate built from the same store sees the grant.
        let reopened = AccessGate::new(&[1], store);
        assert!(reopened.is_allowed(9));
    }

    #[test]
    fn requester_description_includes_known_fields() {
        let request = PendingRequest {
            user_id: 7,
            username: Some("alice".into()),
            first_name: Some("Alice".into()),
            last_name: None,
            requested_at: Utc::now(),
        };
        let text = describe_requester(&request);
        assert!(text.contains("`7`"));
        assert!(text.contains("@alice"));
        assert!(text.contains("Name: Alice"));
    }
}
