use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::channel::{js_literal, ScriptChannel};
use crate::error::KeyupError;
use crate::events::{EventRegistry, OnImmediateReceiver, OnReceiver};

const INPUT_TAGS: &[&str] = &["input", "textarea", "select"];

/// One-time behaviors that can be installed on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    KeySpecificKeyup,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::KeySpecificKeyup => "key_specific_keyup",
        }
    }
}

/// Features installed on a single element. Insert-only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    installed: HashSet<Feature>,
}

impl FeatureSet {
    pub fn contains(&self, feature: Feature) -> bool {
        self.installed.contains(&feature)
    }

    /// Returns `true` when the feature was not installed before.
    pub fn insert(&mut self, feature: Feature) -> bool {
        self.installed.insert(feature)
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}

struct ElementState {
    id: String,
    tag: String,
    features: RefCell<FeatureSet>,
    channel: Rc<dyn ScriptChannel>,
    registry: Rc<EventRegistry>,
}

/// Server-side handle to a node in the client document.
///
/// Clones share state, so features installed through one clone are visible
/// through every other handle to the same node.
#[derive(Clone)]
pub struct Element {
    state: Rc<ElementState>,
}

impl Element {
    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn tag(&self) -> &str {
        &self.state.tag
    }

    /// JavaScript expression evaluating to this node on the client.
    pub fn js_expression(&self) -> String {
        format!("document.getElementById({})", js_literal(&self.state.id))
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.state.features.borrow().contains(feature)
    }

    /// Snapshot of the installed features.
    pub fn features(&self) -> FeatureSet {
        self.state.features.borrow().clone()
    }

    pub(crate) fn install_feature(&self, feature: Feature) -> bool {
        self.state.features.borrow_mut().insert(feature)
    }

    /// Send a script to run against this element on the client.
    pub fn execute(&self, script: &str) {
        self.state.channel.execute(script);
    }

    pub fn on(&self) -> OnReceiver<'_> {
        OnReceiver::new(self)
    }

    pub fn on_immediate(&self) -> OnImmediateReceiver<'_> {
        OnImmediateReceiver::new(self)
    }

    pub(crate) fn registry(&self) -> &EventRegistry {
        &self.state.registry
    }

    pub fn is_input(&self) -> bool {
        INPUT_TAGS
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(&self.state.tag))
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.state.id)
            .field("tag", &self.state.tag)
            .field("features", &*self.state.features.borrow())
            .finish()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

/// An element that accepts keyboard input (`input`, `textarea`, `select`).
#[derive(Debug, Clone, PartialEq)]
pub struct InputElement(Element);

impl InputElement {
    pub fn into_inner(self) -> Element {
        self.0
    }
}

impl TryFrom<Element> for InputElement {
    type Error = KeyupError;

    fn try_from(element: Element) -> Result<Self, Self::Error> {
        if element.is_input() {
            Ok(Self(element))
        } else {
            Err(KeyupError::NotInputElement {
                id: element.id().to_string(),
                tag: element.tag().to_string(),
            })
        }
    }
}

impl Deref for InputElement {
    type Target = Element;

    fn deref(&self) -> &Element {
        &self.0
    }
}

/// Owns the channel and event registry for one client document and hands
/// out element handles.
pub struct Page {
    channel: Rc<dyn ScriptChannel>,
    registry: Rc<EventRegistry>,
    elements: RefCell<HashMap<String, Element>>,
}

impl Page {
    pub fn new(channel: impl ScriptChannel + 'static) -> Self {
        Self {
            channel: Rc::new(channel),
            registry: Rc::new(EventRegistry::new()),
            elements: RefCell::new(HashMap::new()),
        }
    }

    /// Handle for the node with DOM id `id`. Repeated calls for the same id
    /// return the same handle; the tag given first wins.
    pub fn element(&self, id: &str, tag: &str) -> Element {
        self.elements
            .borrow_mut()
            .entry(id.to_string())
            .or_insert_with(|| Element {
                state: Rc::new(ElementState {
                    id: id.to_string(),
                    tag: tag.to_ascii_lowercase(),
                    features: RefCell::new(FeatureSet::default()),
                    channel: Rc::clone(&self.channel),
                    registry: Rc::clone(&self.registry),
                }),
            })
            .clone()
    }

    pub fn input(&self, id: &str, tag: &str) -> Result<InputElement, KeyupError> {
        InputElement::try_from(self.element(id, tag))
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }
}
