use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::channel::{js_literal, ClientMessage};
use crate::element::Element;

/// An event type the client can serialize and the server can decode.
pub trait EventPayload: DeserializeOwned + 'static {
    /// Properties copied off the client event into the payload object.
    const FIELDS: &'static [&'static str];
}

/// Whether a subscription wants the event details sent across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadMode {
    Decoded,
    Immediate,
}

type Callback = Rc<dyn Fn(Option<&JsonValue>) -> bool>;

struct Subscription {
    mode: PayloadMode,
    callback: Callback,
}

type SubscriptionKey = (String, String);

/// Routes client event notifications to server-side callbacks.
///
/// Decoded and immediate subscriptions use separate client forwarders; a
/// notification carrying a payload only reaches decoded subscribers and one
/// without reaches only immediate subscribers.
#[derive(Default)]
pub struct EventRegistry {
    subscriptions: RefCell<HashMap<SubscriptionKey, Vec<Subscription>>>,
    forwarders: RefCell<HashSet<(SubscriptionKey, PayloadMode)>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(
        &self,
        element: &Element,
        event: &str,
        mode: PayloadMode,
        fields: &[&str],
        callback: Callback,
    ) {
        let key = (element.id().to_string(), event.to_string());

        let needs_forwarder = self.forwarders.borrow_mut().insert((key.clone(), mode));
        if needs_forwarder {
            element.execute(&forwarder_script(element, event, mode, fields));
        }

        self.subscriptions
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(Subscription { mode, callback });

        debug!(target = "keyup", element = element.id(), event, ?mode, "subscribed");
    }

    /// Invoke every callback matching `message`, in registration order.
    /// Returns how many callbacks ran.
    pub fn deliver(&self, message: ClientMessage) -> usize {
        let ClientMessage::Event {
            handle,
            event,
            payload,
        } = message;
        let mode = if payload.is_some() {
            PayloadMode::Decoded
        } else {
            PayloadMode::Immediate
        };

        // Callbacks may subscribe again, so release the borrow before calling out.
        let callbacks: Vec<Callback> = match self
            .subscriptions
            .borrow()
            .get(&(handle.clone(), event.clone()))
        {
            Some(subscriptions) => subscriptions
                .iter()
                .filter(|subscription| subscription.mode == mode)
                .map(|subscription| Rc::clone(&subscription.callback))
                .collect(),
            None => {
                debug!(target = "keyup", %handle, %event, "no subscribers for event");
                return 0;
            }
        };

        let mut invoked = 0;
        for callback in &callbacks {
            if callback(payload.as_ref()) {
                invoked += 1;
            }
        }
        invoked
    }

    /// Deliver every notification currently queued by the client.
    pub fn drain(&self, receiver: &mut UnboundedReceiver<ClientMessage>) -> usize {
        let mut invoked = 0;
        while let Ok(message) = receiver.try_recv() {
            invoked += self.deliver(message);
        }
        invoked
    }

    pub fn subscription_count(&self, handle: &str, event: &str) -> usize {
        self.subscriptions
            .borrow()
            .get(&(handle.to_string(), event.to_string()))
            .map_or(0, Vec::len)
    }
}

/// Subscriptions that receive the decoded event details.
pub struct OnReceiver<'a> {
    source: &'a Element,
}

impl<'a> OnReceiver<'a> {
    pub(crate) fn new(source: &'a Element) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Element {
        self.source
    }

    pub fn event<E, F>(&self, name: &str, callback: F) -> Element
    where
        E: EventPayload,
        F: Fn(E) + 'static,
    {
        let event_name = name.to_string();
        let decode: Callback = Rc::new(move |payload: Option<&JsonValue>| {
            let Some(payload) = payload else {
                return false;
            };
            match E::deserialize(payload) {
                Ok(event) => {
                    callback(event);
                    true
                }
                Err(err) => {
                    warn!(target = "keyup", event = %event_name, error = %err, "failed to decode event payload");
                    false
                }
            }
        });
        self.source.registry().subscribe(
            self.source,
            name,
            PayloadMode::Decoded,
            E::FIELDS,
            decode,
        );
        self.source.clone()
    }
}

/// Subscriptions that only need to know the event happened.
pub struct OnImmediateReceiver<'a> {
    source: &'a Element,
}

impl<'a> OnImmediateReceiver<'a> {
    pub(crate) fn new(source: &'a Element) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Element {
        self.source
    }

    pub fn event<F>(&self, name: &str, callback: F) -> Element
    where
        F: Fn() + 'static,
    {
        let invoke: Callback = Rc::new(move |_: Option<&JsonValue>| {
            callback();
            true
        });
        self.source
            .registry()
            .subscribe(self.source, name, PayloadMode::Immediate, &[], invoke);
        self.source.clone()
    }
}

fn forwarder_script(element: &Element, event: &str, mode: PayloadMode, fields: &[&str]) -> String {
    let target = element.js_expression();
    let handle = js_literal(element.id());
    let event = js_literal(event);

    match mode {
        PayloadMode::Immediate => format!(
            r#"(function () {{
    {target}.addEventListener({event}, function () {{
        __keyupBridge.emit({handle}, {event}, null);
    }});
}})();"#
        ),
        PayloadMode::Decoded => {
            let fields = js_literal(fields);
            format!(
                r#"(function () {{
    var fields = {fields};
    {target}.addEventListener({event}, function (event) {{
        var source = (event.detail !== null && typeof event.detail === 'object') ? event.detail : event;
        var payload = {{}};
        for (var i = 0; i < fields.length; i++) {{
            var value = source[fields[i]];
            if (value !== undefined) {{
                payload[fields[i]] = value;
            }}
        }}
        __keyupBridge.emit({handle}, {event}, JSON.stringify(payload));
    }});
}})();"#
            )
        }
    }
}
