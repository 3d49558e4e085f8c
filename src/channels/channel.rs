//! Channel trait and the event/render types exchanged with the core.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;

/// Stream of inbound events from a channel.
pub type EventStream = Pin<Box<dyn Stream<Item = IncomingEvent> + Send>>;

/// The two event kinds the transport delivers to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Raw user-entered text.
    Text(String),
    /// A button press carrying its callback token.
    Button(String),
}

/// One inbound event, scoped to a user/conversation.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    pub channel: String,
    pub user_id: String,
    pub kind: EventKind,
    /// Transport-specific addressing (chat id, message id for edits).
    pub metadata: serde_json::Value,
}

impl IncomingEvent {
    pub fn text(channel: impl Into<String>, user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
            kind: EventKind::Text(text.into()),
            metadata: serde_json::json!({}),
        }
    }

    pub fn button(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
            kind: EventKind::Button(token.into()),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One inline button: display label plus the token sent back on press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Whether the transport should post a new message or edit the one the
/// triggering button lives on. Edit is preferred for page navigation so
/// paging does not flood the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    NewMessage,
    EditMessage,
}

/// Outbound render directive: text plus optional button rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDirective {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
    pub mode: RenderMode,
}

impl RenderDirective {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
            mode: RenderMode::NewMessage,
        }
    }

    pub fn with_buttons(mut self, rows: Vec<Vec<Button>>) -> Self {
        self.buttons = rows;
        self
    }

    pub fn edited(mut self) -> Self {
        self.mode = RenderMode::EditMessage;
        self
    }
}

/// A messaging transport the agent can listen on and reply through.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start listening; returns the inbound event stream.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Deliver a render directive in reply to an event.
    async fn respond(
        &self,
        event: &IncomingEvent,
        directive: RenderDirective,
    ) -> Result<(), ChannelError>;

    /// Best-effort "working on it" indicator before a long call.
    async fn notify_busy(&self, _event: &IncomingEvent) {}

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_builder_defaults_to_new_message() {
        let d = RenderDirective::text("hello");
        assert_eq!(d.mode, RenderMode::NewMessage);
        assert!(d.buttons.is_empty());
    }

    #[test]
    fn directive_builder_chains() {
        let d = RenderDirective::text("page")
            .with_buttons(vec![vec![Button::new("Next", "menu_next")]])
            .edited();
        assert_eq!(d.mode, RenderMode::EditMessage);
        assert_eq!(d.buttons[0][0].token, "menu_next");
    }

    #[test]
    fn event_constructors_set_kind() {
        let t = IncomingEvent::text("telegram", "u1", "hi");
        assert_eq!(t.kind, EventKind::Text("hi".into()));

        let b = IncomingEvent::button("telegram", "u1", "fill_in");
        assert_eq!(b.kind, EventKind::Button("fill_in".into()));
    }

    #[test]
    fn event_metadata_roundtrips() {
        let e = IncomingEvent::text("telegram", "u1", "hi")
            .with_metadata(serde_json::json!({"chat_id": "99"}));
        assert_eq!(e.metadata["chat_id"], "99");
    }
}
