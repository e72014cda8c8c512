use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::telegram::types::{InlineKeyboardMarkup, Message, Update, User};

const API_BASE: &str = "https://api.telegram.org";

/// Slack added to the HTTP timeout of a long-poll request so the server side
/// can expire first.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TgEnvelope<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        // No client-wide timeout: getUpdates long-polls well past it.
        let http = Client::builder()
            .connect_timeout(timeout)
            .user_agent(concat!("suzume/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            http,
            base_url: format!("{API_BASE}/bot{token}"),
            timeout,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
        timeout: Duration,
    ) -> Result<T> {
        let res = self
            .http
            .post(self.url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {method}"))?;
        let envelope: TgEnvelope<T> = res
            .json()
            .await
            .with_context(|| format!("parse {method} response"))?;

        if !envelope.ok {
            bail!(
                "{method} failed: {}",
                envelope.description.unwrap_or_else(|| "unknown error".into())
            );
        }
        envelope
            .result
            .ok_or_else(|| anyhow!("{method}: missing result"))
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({}), self.timeout)
            .await
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, poll: Duration) -> Result<Vec<Update>> {
        #[derive(Serialize)]
        struct Params {
            offset: i64,
            timeout: u64,
            allowed_updates: [&'static str; 2],
        }

        debug!("getUpdates offset={offset}");
        self.call(
            "getUpdates",
            &Params {
                offset,
                timeout: poll.as_secs(),
                allowed_updates: ["message", "callback_query"],
            },
            poll + POLL_GRACE,
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message> {
        #[derive(Serialize)]
        struct Params<'a> {
            chat_id: i64,
            text: &'a str,
            parse_mode: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            reply_markup: Option<&'a InlineKeyboardMarkup>,
        }

        self.call(
            "sendMessage",
            &Params {
                chat_id,
                text,
                parse_mode: "Markdown",
                reply_markup: markup,
            },
            self.timeout,
        )
        .await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct Params<'a> {
            chat_id: i64,
            message_id: i64,
            text: &'a str,
            parse_mode: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            reply_markup: Option<&'a InlineKeyboardMarkup>,
        }

        // The API returns the edited Message or `true`; we need neither.
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &Params {
                    chat_id,
                    message_id,
                    text,
                    parse_mode: "Markdown",
                    reply_markup: markup,
                },
                self.timeout,
            )
            .await?;
        Ok(())
    }

    /// Acknowledge a button press so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Params<'a> {
            callback_query_id: &'a str,
        }

        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                &Params {
                    callback_query_id: callback_id,
                },
                self.timeout,
            )
            .await?;
        Ok(())
    }
}
