use base64::Engine;
use serde::{Deserialize, Serialize};

/// A tappable button offered alongside a reply. The `id` comes back verbatim
/// through the action endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub label: String,
}

impl Action {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Action {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Synchronous answer to a chat message or action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_actions(text: impl Into<String>, actions: Vec<Action>) -> Self {
        Reply {
            text: text.into(),
            actions,
        }
    }
}

/// Asynchronous notification payload pushed over the per-user event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Text {
        text: String,
    },
    TextWithActions {
        text: String,
        actions: Vec<Action>,
    },
    Image {
        // base64, so the payload survives JSON transports unchanged
        data: String,
        caption: String,
    },
}

impl Payload {
    pub fn image(bytes: &[u8], caption: impl Into<String>) -> Self {
        Payload::Image {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            caption: caption.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub user_id: i64,
    pub payload: Payload,
}
