// Library exports for the binary and integration tests

pub mod channel;
pub mod config;
pub mod element;
pub mod error;
pub mod events;
pub mod js;
pub mod keyboard;
pub mod keys;
pub mod keyup;

// Re-export commonly used types
pub use channel::{ClientMessage, QueuedChannel, ScriptChannel, ServerMessage};
pub use element::{Element, Feature, FeatureSet, InputElement, Page};
pub use error::KeyupError;
pub use events::{EventPayload, EventRegistry, OnImmediateReceiver, OnReceiver};
pub use keyboard::KeyboardEvent;
pub use keys::KeySet;
pub use keyup::{
    attach_key_specific_keyup_event, on_key_specific_keyup, on_key_specific_keyup_immediate,
    KeySpecificKeyup, KeySpecificKeyupImmediate, SYNTHETIC_EVENT,
};
