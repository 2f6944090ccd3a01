//! Minimal long-polling client for the Telegram Bot API.

use anyhow::{Context, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use weather_core::{CommandParseError, CommandRequest, Credentials, Router};

pub const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Serialize)]
struct NoParams {}

pub struct TelegramTransport {
    // contains the bot token; never log it
    api_base: String,
    http: Client,
}

impl TelegramTransport {
    pub fn new(credentials: &Credentials, http: Client, base_url: Option<&str>) -> Self {
        let base_url = base_url.unwrap_or(DEFAULT_TELEGRAM_URL).trim_end_matches('/');
        Self { api_base: format!("{base_url}/bot{}", credentials.bot_token()), http }
    }

    /// Poll for updates until interrupted, answering each command in turn.
    pub async fn run(&self, router: &Router) -> anyhow::Result<()> {
        let me: BotUser = self
            .call("getMe", &NoParams {}, None)
            .await
            .context("Telegram rejected the bot token")?;
        let username = me.username.unwrap_or_default();
        info!(username = %username, "connected to Telegram");

        let mut offset = 0;
        loop {
            let updates = tokio::select! {
                res = self.get_updates(offset) => res,
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down");
                    return Ok(());
                }
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.dispatch(router, &username, update).await;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "getUpdates failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    async fn dispatch(&self, router: &Router, username: &str, update: Update) {
        let Some(Message { chat, text: Some(text) }) = update.message else {
            return;
        };

        let request = match parse_command(&text, chat.id, username) {
            Ok(request) => request,
            Err(err) => {
                debug!(chat_id = chat.id, error = %err, "ignoring message");
                return;
            }
        };

        let reply = router.handle(&request).await;
        if let Err(err) = self.send_message(chat.id, &reply).await {
            error!(chat_id = chat.id, error = %err, "failed to send reply");
        }
    }

    async fn get_updates(&self, offset: i64) -> anyhow::Result<Vec<Update>> {
        let params =
            GetUpdates { offset, timeout: POLL_TIMEOUT_SECS, allowed_updates: &["message"] };
        // long poll outlives the client-wide timeout
        let timeout = Duration::from_secs(POLL_TIMEOUT_SECS + 10);
        self.call("getUpdates", &params, Some(timeout)).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let params = SendMessage { chat_id, text, parse_mode: "HTML" };
        let _: serde_json::Value = self.call("sendMessage", &params, None).await?;
        Ok(())
    }

    async fn call<T, P>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let mut request = self.http.post(format!("{}/{method}", self.api_base)).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let body = request
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to send Telegram {method} request"))?
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to read Telegram {method} response body"))?;

        decode_response(method, &body)
    }
}

/// Bots always have a username; without one, accept any `@` suffix.
fn parse_command(
    text: &str,
    chat_id: i64,
    username: &str,
) -> Result<CommandRequest, CommandParseError> {
    if username.is_empty() {
        CommandRequest::parse(text, chat_id)
    } else {
        CommandRequest::parse_for_bot(text, chat_id, username)
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, body: &str) -> anyhow::Result<T> {
    let parsed: ApiResponse<T> = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse Telegram {method} JSON"))?;

    if !parsed.ok {
        return Err(anyhow!(
            "Telegram {method} failed: {}",
            parsed.description.as_deref().unwrap_or("no description")
        ));
    }

    parsed.result.ok_or_else(|| anyhow!("Telegram {method} response has no result"))
}
