use std::str::FromStr;

use keyboard_types::{Key, Location, Modifiers};
use serde::{Deserialize, Serialize};

use crate::events::EventPayload;

/// Keyboard event details as forwarded by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyboardEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub key: String,
    pub code: String,
    pub location: u32,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub repeat: bool,
    pub is_composing: bool,
    pub time_stamp: f64,
}

impl KeyboardEvent {
    pub fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::empty();
        mods.set(Modifiers::ALT, self.alt_key);
        mods.set(Modifiers::CONTROL, self.ctrl_key);
        mods.set(Modifiers::META, self.meta_key);
        mods.set(Modifiers::SHIFT, self.shift_key);
        mods
    }

    /// DOM `KeyboardEvent.location` codes; unknown values map to `Standard`.
    pub fn location(&self) -> Location {
        match self.location {
            1 => Location::Left,
            2 => Location::Right,
            3 => Location::Numpad,
            _ => Location::Standard,
        }
    }

    pub fn logical_key(&self) -> Key {
        Key::from_str(&self.key).unwrap_or(Key::Unidentified)
    }
}

impl EventPayload for KeyboardEvent {
    const FIELDS: &'static [&'static str] = &[
        "type",
        "key",
        "code",
        "location",
        "altKey",
        "ctrlKey",
        "metaKey",
        "shiftKey",
        "repeat",
        "isComposing",
        "timeStamp",
    ];
}
