use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{trace, warn};

/// Server → client traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Execute { script: String },
}

/// Client → server traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Event {
        handle: String,
        event: String,
        #[serde(default)]
        payload: Option<JsonValue>,
    },
}

/// Render `value` as a JavaScript literal.
///
/// JSON output is valid JavaScript except for raw U+2028 and U+2029, which
/// pre-ES2019 engines reject inside string literals; those are escaped.
pub fn js_literal<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| String::from("null"))
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Transmits script fragments to the client runtime.
///
/// Fire-and-forget: implementations must preserve submission order but never
/// report delivery failures back to the caller.
pub trait ScriptChannel {
    fn execute(&self, script: &str);
}

/// Channel backed by an unbounded queue that the client drains in order.
#[derive(Clone)]
pub struct QueuedChannel {
    sender: UnboundedSender<ServerMessage>,
}

impl QueuedChannel {
    pub fn new() -> (Self, UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ScriptChannel for QueuedChannel {
    fn execute(&self, script: &str) {
        trace!(target = "keyup", bytes = script.len(), "queueing client script");
        let message = ServerMessage::Execute {
            script: script.to_string(),
        };
        if self.sender.send(message).is_err() {
            warn!(target = "keyup", "client disconnected; dropping script");
        }
    }
}
