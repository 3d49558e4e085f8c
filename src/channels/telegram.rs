//! Telegram channel — long-polls the Bot API for messages and button
//! presses, renders replies with inline keyboards, and edits messages in
//! place for page navigation.

use async_trait::async_trait;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::channels::channel::{
    Button, Channel, EventStream, IncomingEvent, RenderDirective, RenderMode,
};
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: String,
    allowed_users: Vec<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Check if a user identity is in the allowed list.
    pub fn is_user_allowed(&self, identity: &str) -> bool {
        self.allowed_users.iter().any(|u| u == "*" || u == identity)
    }

    /// Send a text message with an optional inline keyboard. Tries Markdown
    /// first with plain-text fallback, and splits messages over the 4096
    /// char limit (the keyboard rides on the last chunk).
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        buttons: &[Vec<Button>],
    ) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len() - 1;

        for (i, chunk) in chunks.iter().enumerate() {
            let keyboard = (i == last && !buttons.is_empty()).then(|| keyboard_json(buttons));
            self.send_message_chunk(chat_id, chunk, keyboard).await?;
        }
        Ok(())
    }

    /// Send a single message chunk (≤4096 chars), Markdown-first with fallback.
    async fn send_message_chunk(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<serde_json::Value>,
    ) -> Result<(), ChannelError> {
        let mut markdown_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown"
        });
        if let Some(ref kb) = keyboard {
            markdown_body["reply_markup"] = kb.clone();
        }

        let markdown_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&markdown_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if markdown_resp.status().is_success() {
            return Ok(());
        }

        let markdown_status = markdown_resp.status();
        tracing::warn!(
            status = ?markdown_status,
            "Telegram sendMessage with Markdown failed; retrying without parse_mode"
        );

        let mut plain_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(kb) = keyboard {
            plain_body["reply_markup"] = kb;
        }
        let plain_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!(
                    "sendMessage failed (markdown: {markdown_status}, plain: {plain_err})"
                ),
            });
        }

        Ok(())
    }

    /// Edit an existing message's text and keyboard in place. Falls back to
    /// a fresh message when the edit is rejected (e.g. identical content or
    /// the message is too old to edit).
    async fn edit_message(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        buttons: &[Vec<Button>],
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if !buttons.is_empty() {
            body["reply_markup"] = keyboard_json(buttons);
        }

        let resp = self
            .client
            .post(self.api_url("editMessageText"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            return Ok(());
        }

        tracing::debug!(status = ?resp.status(), "editMessageText rejected; sending new message");
        self.send_message(chat_id, text, buttons).await
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let allowed_users = self.allowed_users.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let url = format!("https://api.telegram.org/bot{bot_token}/getUpdates");
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let Some(results) = data.get("result").and_then(serde_json::Value::as_array)
                else {
                    continue;
                };

                for update in results {
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64)
                    {
                        offset = uid + 1;
                    }

                    let event = if let Some(message) = update.get("message") {
                        parse_message_update(message, &allowed_users)
                    } else if let Some(query) = update.get("callback_query") {
                        // Ack the press so the client stops its spinner.
                        if let Some(query_id) = query.get("id").and_then(|v| v.as_str()) {
                            let ack = serde_json::json!({ "callback_query_id": query_id });
                            let url = format!(
                                "https://api.telegram.org/bot{bot_token}/answerCallbackQuery"
                            );
                            let _ = client.post(&url).json(&ack).send().await;
                        }
                        parse_callback_update(query, &allowed_users)
                    } else {
                        None
                    };

                    if let Some(event) = event
                        && tx.send(event).is_err()
                    {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn respond(
        &self,
        event: &IncomingEvent,
        directive: RenderDirective,
    ) -> Result<(), ChannelError> {
        let chat_id = event
            .metadata
            .get("chat_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: "No chat_id in event metadata".into(),
            })?;

        let message_id = event.metadata.get("message_id").and_then(|v| v.as_i64());

        match (directive.mode, message_id) {
            (RenderMode::EditMessage, Some(mid)) => {
                self.edit_message(chat_id, mid, &directive.text, &directive.buttons)
                    .await
            }
            _ => {
                self.send_message(chat_id, &directive.text, &directive.buttons)
                    .await
            }
        }
    }

    async fn notify_busy(&self, event: &IncomingEvent) {
        if let Some(chat_id) = event.metadata.get("chat_id").and_then(|v| v.as_str()) {
            let _ = self
                .client
                .post(self.api_url("sendChatAction"))
                .json(&serde_json::json!({
                    "chat_id": chat_id,
                    "action": "typing"
                }))
                .send()
                .await;
        }
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Update parsing ──────────────────────────────────────────────────

/// Build a text event from a `message` update, or `None` if it carries no
/// text or the sender is not allowed.
fn parse_message_update(message: &serde_json::Value, allowed: &[String]) -> Option<IncomingEvent> {
    let text = message.get("text").and_then(serde_json::Value::as_str)?;
    let from = message.get("from")?;
    let (user_id, username) = sender_identity(from)?;

    if !check_user_allowed(allowed, [user_id.as_str(), username]) {
        tracing::warn!(user_id, username, "Telegram: ignoring message from unauthorized user");
        return None;
    }

    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)?
        .to_string();

    Some(
        IncomingEvent::text("telegram", &user_id, text)
            .with_metadata(serde_json::json!({ "chat_id": chat_id, "username": username })),
    )
}

/// Build a button event from a `callback_query` update. Carries the id of
/// the message the button lives on so replies can edit it in place.
fn parse_callback_update(query: &serde_json::Value, allowed: &[String]) -> Option<IncomingEvent> {
    let token = query.get("data").and_then(serde_json::Value::as_str)?;
    let from = query.get("from")?;
    let (user_id, username) = sender_identity(from)?;

    if !check_user_allowed(allowed, [user_id.as_str(), username]) {
        tracing::warn!(user_id, username, "Telegram: ignoring button press from unauthorized user");
        return None;
    }

    let message = query.get("message")?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)?
        .to_string();
    let message_id = message
        .get("message_id")
        .and_then(serde_json::Value::as_i64)?;

    Some(IncomingEvent::button("telegram", &user_id, token).with_metadata(serde_json::json!({
        "chat_id": chat_id,
        "message_id": message_id,
        "username": username,
    })))
}

fn sender_identity(from: &serde_json::Value) -> Option<(String, &str)> {
    let user_id = from.get("id").and_then(serde_json::Value::as_i64)?.to_string();
    let username = from
        .get("username")
        .and_then(|u| u.as_str())
        .unwrap_or("unknown");
    Some((user_id, username))
}

/// Check if any identity in the iterator matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

/// Serialize button rows into Telegram's `InlineKeyboardMarkup` shape.
fn keyboard_json(rows: &[Vec<Button>]) -> serde_json::Value {
    let keyboard: Vec<Vec<serde_json::Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| serde_json::json!({ "text": b.label, "callback_data": b.token }))
                .collect()
        })
        .collect();
    serde_json::json!({ "inline_keyboard": keyboard })
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        // Floor the hard cut to a char boundary so multibyte text (emoji,
        // CJK) never panics the slice.
        let mut cut = max_len;
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }

        let chunk = &remaining[..cut];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(cut);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { cut } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::channel::EventKind;

    #[test]
    fn telegram_channel_name() {
        let ch = TelegramChannel::new("fake-token".into(), vec!["*".into()]);
        assert_eq!(ch.name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        let ch = TelegramChannel::new("123:ABC".into(), vec![]);
        assert_eq!(
            ch.api_url("getUpdates"),
            "https://api.telegram.org/bot123:ABC/getUpdates"
        );
    }

    // ── User allowlist ──────────────────────────────────────────────

    #[test]
    fn user_allowed_wildcard() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        assert!(ch.is_user_allowed("anyone"));
    }

    #[test]
    fn user_allowed_specific() {
        let ch = TelegramChannel::new("t".into(), vec!["alice".into(), "bob".into()]);
        assert!(ch.is_user_allowed("alice"));
        assert!(!ch.is_user_allowed("eve"));
    }

    #[test]
    fn user_denied_empty_list() {
        let ch = TelegramChannel::new("t".into(), vec![]);
        assert!(!ch.is_user_allowed("anyone"));
    }

    #[test]
    fn user_exact_match_not_substring() {
        let ch = TelegramChannel::new("t".into(), vec!["alice".into()]);
        assert!(!ch.is_user_allowed("alice_bot"));
        assert!(!ch.is_user_allowed("malice"));
    }

    #[test]
    fn allowlist_matches_any_identity() {
        assert!(check_user_allowed(
            &["123456789".to_string()],
            ["unknown", "123456789"]
        ));
        assert!(!check_user_allowed(
            &["alice".to_string()],
            ["unknown", "123456789"]
        ));
    }

    // ── Update parsing ──────────────────────────────────────────────

    fn message_update() -> serde_json::Value {
        serde_json::json!({
            "text": "70.5",
            "from": { "id": 42, "username": "alice" },
            "chat": { "id": 99 },
        })
    }

    fn callback_update() -> serde_json::Value {
        serde_json::json!({
            "id": "q1",
            "data": "menu_next",
            "from": { "id": 42, "username": "alice" },
            "message": { "message_id": 1234, "chat": { "id": 99 } },
        })
    }

    #[test]
    fn message_update_becomes_text_event() {
        let event = parse_message_update(&message_update(), &["*".to_string()]).unwrap();
        assert_eq!(event.user_id, "42");
        assert_eq!(event.kind, EventKind::Text("70.5".into()));
        assert_eq!(event.metadata["chat_id"], "99");
    }

    #[test]
    fn message_update_unauthorized_is_dropped() {
        assert!(parse_message_update(&message_update(), &["bob".to_string()]).is_none());
    }

    #[test]
    fn message_update_allowed_by_numeric_id() {
        assert!(parse_message_update(&message_update(), &["42".to_string()]).is_some());
    }

    #[test]
    fn message_update_without_text_is_dropped() {
        let update = serde_json::json!({
            "from": { "id": 42 },
            "chat": { "id": 99 },
            "sticker": {}
        });
        assert!(parse_message_update(&update, &["*".to_string()]).is_none());
    }

    #[test]
    fn callback_update_becomes_button_event() {
        let event = parse_callback_update(&callback_update(), &["*".to_string()]).unwrap();
        assert_eq!(event.kind, EventKind::Button("menu_next".into()));
        assert_eq!(event.metadata["chat_id"], "99");
        assert_eq!(event.metadata["message_id"], 1234);
    }

    #[test]
    fn callback_update_unauthorized_is_dropped() {
        assert!(parse_callback_update(&callback_update(), &[]).is_none());
    }

    #[test]
    fn callback_update_without_data_is_dropped() {
        let mut update = callback_update();
        update.as_object_mut().unwrap().remove("data");
        assert!(parse_callback_update(&update, &["*".to_string()]).is_none());
    }

    // ── Keyboard serialization ──────────────────────────────────────

    #[test]
    fn keyboard_json_shape() {
        let rows = vec![
            vec![Button::new("Male", "sex_male"), Button::new("Female", "sex_female")],
            vec![Button::new("Back", "back_to_main")],
        ];
        let kb = keyboard_json(&rows);
        assert_eq!(kb["inline_keyboard"][0][0]["text"], "Male");
        assert_eq!(kb["inline_keyboard"][0][1]["callback_data"], "sex_female");
        assert_eq!(kb["inline_keyboard"][1][0]["callback_data"], "back_to_main");
    }

    // ── Message splitting ───────────────────────────────────────────

    #[test]
    fn split_message_short() {
        let chunks = split_message("Hello", 4096);
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn split_message_exact_limit() {
        let msg = "a".repeat(4096);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 4096);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(2000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn split_message_multibyte_hard_cut() {
        // 4-byte emoji with no whitespace: the hard cut must land on a
        // char boundary, not panic mid-emoji.
        let msg = format!("a{}", "🥗".repeat(2000));
        let chunks = split_message(&msg, 4096);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len() <= 4096);
        }
        assert_eq!(chunks.concat(), msg);
    }
}
