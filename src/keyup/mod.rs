//! Client-side key filtering for `keyup`.
//!
//! Instead of forwarding every `keyup` to the server, an input element gets a
//! client filter that raises [`SYNTHETIC_EVENT`] only for the configured keys.
//! Subscriptions bind to that event and require the filter to be attached
//! first.

mod script;

use tracing::debug;

pub use script::KeyFilterScript;

use crate::element::{Element, Feature, InputElement};
use crate::error::KeyupError;
use crate::events::{OnImmediateReceiver, OnReceiver};
use crate::keyboard::KeyboardEvent;
use crate::keys::KeySet;

/// Name of the event dispatched on the element when a filtered key is released.
pub const SYNTHETIC_EVENT: &str = "keySpecificKeyUpEvent";

const ALREADY_ATTACHED: &str = "KeySpecificKeyupEvent may only be attached once per element";
const NOT_ATTACHED: &str =
    "attach_key_specific_keyup_event must be called before listening for keySpecificKeyup";

/// Install the client filter for `keys` on `element`.
///
/// Fails with `InvalidArgument` for an empty key list and with
/// `PreconditionViolation` if the filter is already installed. On failure the
/// element is untouched and nothing is sent to the client.
pub fn attach_key_specific_keyup_event<I, S>(
    element: &InputElement,
    keys: I,
) -> Result<(), KeyupError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let keys = KeySet::new(keys)?;
    if element.has_feature(Feature::KeySpecificKeyup) {
        return Err(KeyupError::PreconditionViolation(ALREADY_ATTACHED));
    }

    element.install_feature(Feature::KeySpecificKeyup);
    let script = KeyFilterScript {
        target: element.js_expression(),
        event: SYNTHETIC_EVENT,
        keys: &keys,
    }
    .render();
    element.execute(&script);

    debug!(
        target = "keyup",
        element = element.id(),
        keys = keys.len(),
        feature = Feature::KeySpecificKeyup.as_str(),
        "attached key filter"
    );
    Ok(())
}

impl InputElement {
    pub fn attach_key_specific_keyup_event<I, S>(&self, keys: I) -> Result<(), KeyupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        attach_key_specific_keyup_event(self, keys)
    }
}

fn ensure_attached(element: &Element) -> Result<(), KeyupError> {
    if element.has_feature(Feature::KeySpecificKeyup) {
        Ok(())
    } else {
        Err(KeyupError::PreconditionViolation(NOT_ATTACHED))
    }
}

/// Listen for filtered key releases with the full keyboard event.
pub trait KeySpecificKeyup {
    fn key_specific_keyup<F>(&self, callback: F) -> Result<Element, KeyupError>
    where
        F: Fn(KeyboardEvent) + 'static;
}

impl KeySpecificKeyup for OnReceiver<'_> {
    fn key_specific_keyup<F>(&self, callback: F) -> Result<Element, KeyupError>
    where
        F: Fn(KeyboardEvent) + 'static,
    {
        ensure_attached(self.source())?;
        Ok(self.event(SYNTHETIC_EVENT, callback))
    }
}

/// Listen for filtered key releases without shipping the event details.
pub trait KeySpecificKeyupImmediate {
    fn key_specific_keyup<F>(&self, callback: F) -> Result<Element, KeyupError>
    where
        F: Fn() + 'static;
}

impl KeySpecificKeyupImmediate for OnImmediateReceiver<'_> {
    fn key_specific_keyup<F>(&self, callback: F) -> Result<Element, KeyupError>
    where
        F: Fn() + 'static,
    {
        ensure_attached(self.source())?;
        Ok(self.event(SYNTHETIC_EVENT, callback))
    }
}

pub fn on_key_specific_keyup<F>(element: &Element, callback: F) -> Result<Element, KeyupError>
where
    F: Fn(KeyboardEvent) + 'static,
{
    element.on().key_specific_keyup(callback)
}

pub fn on_key_specific_keyup_immediate<F>(
    element: &Element,
    callback: F,
) -> Result<Element, KeyupError>
where
    F: Fn() + 'static,
{
    element.on_immediate().key_specific_keyup(callback)
}
