//! In-memory document host.
//!
//! A small element arena with jQuery-flavoured event listener tables. The
//! meter only ever talks to the page through this module, so it can be
//! driven from tests, a terminal front-end, or a real DOM bridge.

mod selector;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

pub use selector::{Selector, SelectorError};

/// Handle to an element stored in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event listener callback. Runs synchronously with full access to the document.
pub type Handler = Rc<dyn Fn(&mut Document)>;

/// Identifies the listeners installed by one `on` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

/// One `name.namespace` entry of an event string.
///
/// Either part may be empty: `keyup` has no namespace, `.entropizer`
/// addresses every event in the namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    pub name: String,
    pub namespace: Option<String>,
}

impl EventSpec {
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((name, ns)) => Self {
                name: name.to_string(),
                namespace: (!ns.is_empty()).then(|| ns.to_string()),
            },
            None => Self {
                name: raw.to_string(),
                namespace: None,
            },
        }
    }

    /// Splits a space separated event string into specs.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split_whitespace().map(Self::parse).collect()
    }

    fn matches(&self, listener: &Listener) -> bool {
        (self.name.is_empty() || self.name == listener.event)
            && self
                .namespace
                .as_ref()
                .is_none_or(|ns| listener.namespace.as_ref() == Some(ns))
    }
}

impl fmt::Display for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", self.name, ns),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    html: String,
    value: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

struct Listener {
    key: ListenerKey,
    event: String,
    namespace: Option<String>,
    handler: Handler,
}

/// Element tree plus per-element listener tables.
///
/// Operations on an id that no longer exists are no-ops, mirroring what
/// happens when a jQuery method is called on an empty collection.
pub struct Document {
    nodes: Vec<Option<Element>>,
    body: ElementId,
    listeners: HashMap<ElementId, Vec<Listener>>,
    next_key: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.nodes.iter().flatten().count())
            .field("listeners", &self.listeners.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Element::new("body"))],
            body: ElementId(0),
            listeners: HashMap::new(),
            next_key: 0,
        }
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.nodes.push(Some(Element::new(tag)));
        ElementId(self.nodes.len() - 1)
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Removes the element and its subtree, dropping all of their listeners.
    pub fn remove(&mut self, id: ElementId) {
        if id == self.body || !self.contains(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
            }
            self.listeners.remove(&current);
        }
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.element(id).is_some()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.element(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(node) = self.node_mut(id) {
            if !node.has_class(class) {
                node.classes.push(class.to_string());
            }
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    /// Sets one inline style property.
    pub fn css(&mut self, id: ElementId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.styles.insert(property.to_string(), value.to_string());
        }
    }

    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.element(id)
            .and_then(|e| e.styles.get(property))
            .map(String::as_str)
    }

    pub fn set_html(&mut self, id: ElementId, html: &str) {
        if let Some(node) = self.node_mut(id) {
            node.html = html.to_string();
        }
    }

    pub fn html(&self, id: ElementId) -> Option<&str> {
        self.element(id).map(|e| e.html.as_str())
    }

    pub fn set_value(&mut self, id: ElementId, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.value = Some(value.to_string());
        }
    }

    /// Current form value; `None` when the element is gone or never had one.
    pub fn value(&self, id: ElementId) -> Option<&str> {
        self.element(id).and_then(|e| e.value.as_deref())
    }

    /// All elements matching `selector`, in document order.
    ///
    /// An unparsable selector matches nothing.
    pub fn query(&self, selector: &str) -> Vec<ElementId> {
        match Selector::parse(selector) {
            Ok(selector) => self.select(&selector),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("selector {:?} matches nothing: {}", selector, _e);
                Vec::new()
            }
        }
    }

    pub fn select(&self, selector: &Selector) -> Vec<ElementId> {
        let mut found = Vec::new();
        let mut stack = vec![self.body];
        while let Some(id) = stack.pop() {
            if selector.matches(self, id) {
                found.push(id);
                if selector.first_only() {
                    break;
                }
            }
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    /// Registers `handler` on `id` for every entry of the space separated
    /// `events` string. All registrations share the returned key.
    pub fn on(&mut self, id: ElementId, events: &str, handler: Handler) -> ListenerKey {
        let key = ListenerKey(self.next_key);
        self.next_key += 1;
        if !self.contains(id) {
            return key;
        }
        let table = self.listeners.entry(id).or_default();
        for spec in EventSpec::parse_list(events) {
            table.push(Listener {
                key,
                event: spec.name,
                namespace: spec.namespace,
                handler: Rc::clone(&handler),
            });
        }
        key
    }

    /// Removes listeners on `id` matching any entry of `events`, restricted
    /// to `key` when one is given. Returns how many were removed.
    pub fn off(&mut self, id: ElementId, events: &str, key: Option<ListenerKey>) -> usize {
        let specs = EventSpec::parse_list(events);
        let Some(table) = self.listeners.get_mut(&id) else {
            return 0;
        };
        let before = table.len();
        table.retain(|l| {
            let selected = specs.iter().any(|s| s.matches(l)) && key.is_none_or(|k| k == l.key);
            !selected
        });
        let removed = before - table.len();
        if table.is_empty() {
            self.listeners.remove(&id);
        }
        removed
    }

    /// Number of listeners on `id` matching `event` (a `name.namespace` spec).
    pub fn listener_count(&self, id: ElementId, event: &str) -> usize {
        let spec = EventSpec::parse(event);
        self.listeners
            .get(&id)
            .map(|table| table.iter().filter(|l| spec.matches(l)).count())
            .unwrap_or(0)
    }

    /// Fires `event` on `id`, running matching listeners synchronously in
    /// registration order. Returns the number of handlers invoked.
    pub fn trigger(&mut self, id: ElementId, event: &str) -> usize {
        let spec = EventSpec::parse(event);
        let handlers: Vec<Handler> = self
            .listeners
            .get(&id)
            .map(|table| {
                table
                    .iter()
                    .filter(|l| spec.matches(l))
                    .map(|l| Rc::clone(&l.handler))
                    .collect()
            })
            .unwrap_or_default();
        for handler in &handlers {
            handler(self);
        }
        handlers.len()
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn detach(&mut self, id: ElementId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }
}
