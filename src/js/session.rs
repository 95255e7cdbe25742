use anyhow::{Context as AnyhowContext, Result};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::debug;

use super::client::{ClientOptions, ClientPage};
use crate::channel::{ClientMessage, QueuedChannel, ServerMessage};
use crate::element::{Element, InputElement, Page};
use crate::keyboard::KeyboardEvent;

/// A server `Page` wired to an in-process `ClientPage`.
///
/// Scripts queue up until the next `pump`, mirroring an asynchronous channel;
/// `key_up` pumps before and after the keystroke so callbacks have run by the
/// time it returns.
pub struct LocalSession {
    page: Page,
    client: ClientPage,
    scripts: UnboundedReceiver<ServerMessage>,
    notifications: UnboundedReceiver<ClientMessage>,
}

impl LocalSession {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let (channel, scripts) = QueuedChannel::new();
        let (emitter, notifications) = unbounded_channel();
        let client = ClientPage::new(emitter, options).context("failed to start client page")?;
        Ok(Self {
            page: Page::new(channel),
            client,
            scripts,
            notifications,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn client(&self) -> &ClientPage {
        &self.client
    }

    /// Declare a node on the client and return its server handle.
    pub fn element(&self, id: &str, tag: &str) -> Result<Element> {
        self.client.declare(id, tag)?;
        Ok(self.page.element(id, tag))
    }

    pub fn input(&self, id: &str, tag: &str) -> Result<InputElement> {
        let element = self.element(id, tag)?;
        Ok(InputElement::try_from(element)?)
    }

    /// Run queued scripts on the client, then deliver its notifications.
    /// Returns the number of server callbacks invoked.
    pub fn pump(&mut self) -> usize {
        let scripts = self.client.run_pending(&mut self.scripts);
        let invoked = self.page.registry().drain(&mut self.notifications);
        if scripts > 0 || invoked > 0 {
            debug!(target = "keyup", scripts, invoked, "pumped session");
        }
        invoked
    }

    pub fn key_up(&mut self, id: &str, key: &str) -> Result<usize> {
        self.key_up_with(
            id,
            &KeyboardEvent {
                key: key.to_string(),
                ..KeyboardEvent::default()
            },
        )
    }

    pub fn key_up_with(&mut self, id: &str, init: &KeyboardEvent) -> Result<usize> {
        self.pump();
        self.client.key_up_with(id, init)?;
        Ok(self.pump())
    }
}
