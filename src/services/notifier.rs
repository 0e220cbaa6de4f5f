use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::models::{Action, OutboundMessage, Payload};

/// Outbound delivery surface. Notifications are fire-and-forget: a failed
/// send is the transport's problem, never the engine's.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, user_id: i64, text: &str);

    async fn send_text_with_actions(&self, user_id: i64, text: &str, actions: Vec<Action>);

    async fn send_image(&self, user_id: i64, image: Vec<u8>, caption: &str);
}

/// Publishes onto the process-wide broadcast channel; the per-user SSE
/// endpoint filters and forwards.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<OutboundMessage>,
}

impl BroadcastNotifier {
    pub fn new(tx: broadcast::Sender<OutboundMessage>) -> Self {
        Self { tx }
    }

    fn publish(&self, user_id: i64, payload: Payload) {
        // send only errors when nobody is subscribed; that's fine
        let _ = self.tx.send(OutboundMessage { user_id, payload });
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn send_text(&self, user_id: i64, text: &str) {
        self.publish(
            user_id,
            Payload::Text {
                text: text.to_string(),
            },
        );
    }

    async fn send_text_with_actions(&self, user_id: i64, text: &str, actions: Vec<Action>) {
        self.publish(
            user_id,
            Payload::TextWithActions {
                text: text.to_string(),
                actions,
            },
        );
    }

    async fn send_image(&self, user_id: i64, image: Vec<u8>, caption: &str) {
        self.publish(user_id, Payload::image(&image, caption));
    }
}
