use std::cell::Cell;

use anyhow::{Context as AnyhowContext, Result};
use rquickjs::Function;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{error, warn};

use super::runtime::QuickJsEngine;
use crate::channel::{js_literal, ClientMessage, ServerMessage};
use crate::keyboard::KeyboardEvent;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClientOptions {
    /// Hide `window.CustomEvent`, leaving only `document.createEvent`.
    pub legacy_events: bool,
}

/// In-process client document: a flat set of declared elements with DOM-style
/// event dispatch, driven by scripts from the server.
pub struct ClientPage {
    engine: QuickJsEngine,
    executed: Cell<usize>,
}

impl ClientPage {
    pub fn new(emitter: UnboundedSender<ClientMessage>, options: ClientOptions) -> Result<Self> {
        let engine = QuickJsEngine::new()?;
        engine
            .with_context(|ctx| {
                let emit = Function::new(
                    ctx.clone(),
                    move |handle: String, event: String, payload: Option<String>| {
                        emit_to_server(&emitter, handle, event, payload);
                    },
                )?
                .with_name("__keyup_emit")?;
                ctx.globals().set("__keyup_emit", emit)?;
                Ok(())
            })
            .context("failed to install client emit hook")?;
        engine
            .eval(CLIENT_BOOTSTRAP, "client-bootstrap.js")
            .context("failed to bootstrap client document")?;
        if options.legacy_events {
            engine.eval("delete globalThis.CustomEvent;", "legacy-events.js")?;
        }

        Ok(Self {
            engine,
            executed: Cell::new(0),
        })
    }

    /// Create a node with DOM id `id`.
    pub fn declare(&self, id: &str, tag: &str) -> Result<()> {
        let script = format!(
            "__keyupClient.declare({}, {});",
            js_literal(id),
            js_literal(tag)
        );
        self.engine
            .eval(&script, "declare.js")
            .with_context(|| format!("failed to declare element '{id}'"))
    }

    /// Run every queued server script in order. Returns how many succeeded.
    pub fn run_pending(&self, scripts: &mut UnboundedReceiver<ServerMessage>) -> usize {
        let mut succeeded = 0;
        while let Ok(ServerMessage::Execute { script }) = scripts.try_recv() {
            let index = self.executed.get();
            self.executed.set(index + 1);
            let filename = format!("server-script-{index}.js");
            match self.engine.eval(&script, &filename) {
                Ok(()) => succeeded += 1,
                Err(err) => {
                    error!(target = "quickjs", %filename, error = %err, "server script failed");
                }
            }
        }
        succeeded
    }

    /// Release `key` on element `id`. Returns `false` if a listener called
    /// `preventDefault`.
    pub fn key_up(&self, id: &str, key: &str) -> Result<bool> {
        self.key_up_with(
            id,
            &KeyboardEvent {
                key: key.to_string(),
                ..KeyboardEvent::default()
            },
        )
    }

    pub fn key_up_with(&self, id: &str, init: &KeyboardEvent) -> Result<bool> {
        let script = format!(
            "__keyupClient.keyUp({}, {});",
            js_literal(id),
            js_literal(init)
        );
        self.engine
            .eval_with(&script, "key-up.js")
            .with_context(|| format!("failed to dispatch keyup on '{id}'"))
    }

    /// Number of times `event` has been dispatched with `id` as its target.
    pub fn dispatch_count(&self, id: &str, event: &str) -> Result<u32> {
        let script = format!(
            "__keyupClient.dispatched({}, {});",
            js_literal(id),
            js_literal(event)
        );
        self.engine.eval_with(&script, "dispatch-count.js")
    }

    pub fn engine(&self) -> &QuickJsEngine {
        &self.engine
    }
}

fn emit_to_server(
    emitter: &UnboundedSender<ClientMessage>,
    handle: String,
    event: String,
    payload: Option<String>,
) {
    let payload = match payload.as_deref().map(serde_json::from_str::<JsonValue>) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(err)) => {
            warn!(target = "quickjs", %handle, %event, error = %err, "dropping malformed event payload");
            return;
        }
    };

    let message = ClientMessage::Event {
        handle,
        event,
        payload,
    };
    if emitter.send(message).is_err() {
        warn!(target = "quickjs", "server disconnected; dropping event");
    }
}

const CLIENT_BOOTSTRAP: &str = r#"
(() => {
    const global = globalThis;
    global.window = global;
    const nodes = new Map();

    function EventTarget() {
        this._listeners = {};
        this._dispatched = {};
    }
    EventTarget.prototype.addEventListener = function (type, listener) {
        if (!listener) {
            return;
        }
        const list = this._listeners[type] || (this._listeners[type] = []);
        if (list.indexOf(listener) === -1) {
            list.push(listener);
        }
    };
    EventTarget.prototype.removeEventListener = function (type, listener) {
        const list = this._listeners[type];
        if (list) {
            const index = list.indexOf(listener);
            if (index !== -1) {
                list.splice(index, 1);
            }
        }
    };
    function invoke(currentTarget, event) {
        event.currentTarget = currentTarget;
        const list = (currentTarget._listeners[event.type] || []).slice();
        for (const listener of list) {
            if (typeof listener === 'function') {
                listener.call(currentTarget, event);
            } else if (typeof listener.handleEvent === 'function') {
                listener.handleEvent(event);
            }
        }
    }
    EventTarget.prototype.dispatchEvent = function (event) {
        if (!(event instanceof Event) || !event.type) {
            throw new TypeError('dispatchEvent: parameter 1 is not an initialized Event');
        }
        event.target = this;
        this._dispatched[event.type] = (this._dispatched[event.type] || 0) + 1;
        invoke(this, event);
        if (event.bubbles && !event._stopped && this !== global.document) {
            invoke(global.document, event);
        }
        event.currentTarget = null;
        return !event.defaultPrevented;
    };

    function Event(type, init) {
        init = init || {};
        this.type = String(type);
        this.bubbles = !!init.bubbles;
        this.cancelable = !!init.cancelable;
        this.defaultPrevented = false;
        this.timeStamp = Date.now();
        this.target = null;
        this.currentTarget = null;
        this._stopped = false;
    }
    Event.prototype.preventDefault = function () {
        if (this.cancelable) {
            this.defaultPrevented = true;
        }
    };
    Event.prototype.stopPropagation = function () {
        this._stopped = true;
    };

    function KeyboardEvent(type, init) {
        Event.call(this, type, init);
        init = init || {};
        this.key = init.key || '';
        this.code = init.code || '';
        this.location = init.location || 0;
        this.altKey = !!init.altKey;
        this.ctrlKey = !!init.ctrlKey;
        this.metaKey = !!init.metaKey;
        this.shiftKey = !!init.shiftKey;
        this.repeat = !!init.repeat;
        this.isComposing = !!init.isComposing;
    }
    KeyboardEvent.prototype = Object.create(Event.prototype);
    KeyboardEvent.prototype.constructor = KeyboardEvent;

    function CustomEvent(type, init) {
        Event.call(this, type, init);
        this.detail = init && 'detail' in init ? init.detail : null;
    }
    CustomEvent.prototype = Object.create(Event.prototype);
    CustomEvent.prototype.constructor = CustomEvent;
    CustomEvent.prototype.initCustomEvent = function (type, bubbles, cancelable, detail) {
        this.type = String(type);
        this.bubbles = !!bubbles;
        this.cancelable = !!cancelable;
        this.detail = detail === undefined ? null : detail;
        this.defaultPrevented = false;
    };

    function Element(id, tag) {
        EventTarget.call(this);
        this.id = id;
        this.tagName = String(tag).toUpperCase();
    }
    Element.prototype = Object.create(EventTarget.prototype);

    const document = new EventTarget();
    document.getElementById = (id) => nodes.get(id) || null;
    document.createEvent = (kind) => {
        if (kind !== 'CustomEvent') {
            throw new Error('NotSupportedError: ' + kind);
        }
        const event = Object.create(CustomEvent.prototype);
        Event.call(event, '', {});
        event.detail = null;
        return event;
    };

    global.document = document;
    global.Event = Event;
    global.KeyboardEvent = KeyboardEvent;
    global.CustomEvent = CustomEvent;

    global.__keyupBridge = {
        emit(handle, event, payload) {
            global.__keyup_emit(
                String(handle),
                String(event),
                payload === null || payload === undefined ? null : String(payload)
            );
        },
    };

    global.__keyupClient = {
        declare(id, tag) {
            if (!nodes.has(id)) {
                nodes.set(id, new Element(id, tag));
            }
        },
        keyUp(id, init) {
            const node = nodes.get(id);
            if (!node) {
                throw new Error('unknown element ' + id);
            }
            const options = Object.assign({}, init, { bubbles: true, cancelable: true });
            return node.dispatchEvent(new KeyboardEvent('keyup', options));
        },
        dispatched(id, type) {
            const node = nodes.get(id);
            return node ? (node._dispatched[type] || 0) : 0;
        },
    };
})();
"#;
