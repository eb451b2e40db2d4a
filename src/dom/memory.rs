//! An in-memory document, used as the host DOM when not targeting `wasm32`.
//!
//! It supports exactly what rendering needs: elements with namespaced tag
//! names, attributes and event listeners, and text nodes. Events can be
//! dispatched synchronously and bubble to ancestors. Every mutation made by
//! the reconciler is counted, which makes it possible to check that an
//! idempotent re-render touches nothing.

use crate::vnode::Handler;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// The namespace of ordinary elements.
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node in the in-memory document. Cloning the handle does not clone the
/// node; equality is identity.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

struct NodeData {
    kind: NodeKind,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Node>>,
    listeners: RefCell<Vec<(String, Handler)>>,
}

enum NodeKind {
    Element {
        tag: String,
        namespace: String,
        attributes: RefCell<Vec<(String, String)>>,
    },
    Text(RefCell<String>),
}

impl Node {
    fn new(kind: NodeKind) -> Node {
        Node(Rc::new(NodeData {
            kind,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(vec![]),
            listeners: RefCell::new(vec![]),
        }))
    }

    /// A detached HTML element.
    pub fn element(tag: &str) -> Node {
        Node::element_ns(tag, HTML_NAMESPACE)
    }

    /// A detached element in the given namespace.
    pub fn element_ns(tag: &str, namespace: &str) -> Node {
        Node::new(NodeKind::Element {
            tag: tag.to_string(),
            namespace: namespace.to_string(),
            attributes: RefCell::new(vec![]),
        })
    }

    /// A detached text node.
    pub fn text(content: &str) -> Node {
        Node::new(NodeKind::Text(RefCell::new(content.to_string())))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        match self.0.kind {
            NodeKind::Text(_) => true,
            NodeKind::Element { .. } => false,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn namespace_uri(&self) -> Option<String> {
        match &self.0.kind {
            NodeKind::Element { namespace, .. } => Some(namespace.clone()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.0.kind {
            NodeKind::Element { attributes, .. } => attributes
                .borrow()
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// All attributes, in the order they were first set.
    pub fn attributes(&self) -> Vec<(String, String)> {
        match &self.0.kind {
            NodeKind::Element { attributes, .. } => attributes.borrow().clone(),
            NodeKind::Text(_) => vec![],
        }
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &self.0.kind {
            let mut attributes = attributes.borrow_mut();
            match attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let NodeKind::Element { attributes, .. } = &self.0.kind {
            attributes.borrow_mut().retain(|(k, _)| k != name);
        }
    }

    /// A text node's content, or the concatenated content of an element's
    /// descendant text nodes.
    pub fn text_content(&self) -> String {
        match &self.0.kind {
            NodeKind::Text(content) => content.borrow().clone(),
            NodeKind::Element { .. } => self
                .children()
                .iter()
                .map(Node::text_content)
                .collect(),
        }
    }

    /// Replace the node's content. On an element this drops all children in
    /// favor of a single text node.
    pub fn set_text_content(&self, text: &str) {
        match &self.0.kind {
            NodeKind::Text(content) => *content.borrow_mut() = text.to_string(),
            NodeKind::Element { .. } => {
                for child in self.children() {
                    self.remove_child(&child);
                }
                self.append_child(&Node::text(text));
            }
        }
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    fn index_in(&self, parent: &Node) -> Option<usize> {
        parent.0.children.borrow().iter().position(|c| c == self)
    }

    fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.0.children.borrow_mut().retain(|c| c != self);
        }
        *self.0.parent.borrow_mut() = Weak::new();
    }

    /// Append `child`, moving it out of its current parent first.
    pub fn append_child(&self, child: &Node) {
        child.detach();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
    }

    /// Put `new` where `old` is. Returns `false`, changing nothing, when `old`
    /// is not a child of this node.
    pub fn replace_child(&self, new: &Node, old: &Node) -> bool {
        if old.index_in(self).is_none() {
            return false;
        }
        new.detach();
        let index = match old.index_in(self) {
            Some(index) => index,
            None => return false,
        };
        self.0.children.borrow_mut()[index] = new.clone();
        *new.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        *old.0.parent.borrow_mut() = Weak::new();
        true
    }

    /// Returns `false` when `child` is not a child of this node.
    pub fn remove_child(&self, child: &Node) -> bool {
        if child.index_in(self).is_none() {
            return false;
        }
        child.detach();
        true
    }

    /// How many listeners are registered for `event` on this node.
    pub fn listener_count(&self, event: &str) -> usize {
        self.0
            .listeners
            .borrow()
            .iter()
            .filter(|(e, _)| e == event)
            .count()
    }

    /// Synchronously dispatch an event of the given type at this node. It
    /// bubbles through every ancestor.
    pub fn dispatch(&self, event_type: &str) {
        let event = Event {
            kind: event_type.to_string(),
            target: self.clone(),
        };
        let mut current = Some(self.clone());
        while let Some(node) = current {
            // Handlers may re-render, which can add or remove listeners.
            let handlers: Vec<Handler> = node
                .0
                .listeners
                .borrow()
                .iter()
                .filter(|(e, _)| *e == event.kind)
                .map(|(_, h)| h.clone())
                .collect();
            for handler in handlers {
                handler.call(&event);
            }
            current = node.parent();
        }
    }

    /// Serialized children. Attributes are written sorted by name.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            child.write_html(&mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.0.kind {
            NodeKind::Text(content) => escape(&content.borrow(), false, out),
            NodeKind::Element {
                tag, attributes, ..
            } => {
                out.push('<');
                out.push_str(tag);
                let mut attributes = attributes.borrow().clone();
                attributes.sort();
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(&name);
                    out.push_str("=\"");
                    escape(&value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in self.children() {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape(s: &str, attribute: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Text(content) => write!(f, "#text({:?})", content.borrow()),
            NodeKind::Element { tag, .. } => write!(f, "<{}>", tag),
        }
    }
}

/// An event dispatched with `Node::dispatch`.
#[derive(Clone, Debug)]
pub struct Event {
    kind: String,
    target: Node,
}

impl Event {
    /// The event's type, such as `"click"`.
    pub fn type_(&self) -> String {
        self.kind.clone()
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> &Node {
        &self.target
    }
}

/// Counts of the DOM operations rendering has performed on this thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mutations {
    pub created: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub removed: usize,
    pub text_set: usize,
}

impl Mutations {
    /// The total number of operations.
    pub fn total(&self) -> usize {
        self.created
            + self.attributes_set
            + self.attributes_removed
            + self.listeners_added
            + self.listeners_removed
            + self.inserted
            + self.replaced
            + self.removed
            + self.text_set
    }
}

thread_local! {
    static MUTATIONS: Cell<Mutations> = Cell::new(Mutations::default());
}

fn record(f: impl FnOnce(&mut Mutations)) {
    MUTATIONS.with(|m| {
        let mut counts = m.get();
        f(&mut counts);
        m.set(counts);
    });
}

/// The operations performed since the last `reset_mutations` on this thread.
pub fn mutations() -> Mutations {
    MUTATIONS.with(Cell::get)
}

pub fn reset_mutations() {
    MUTATIONS.with(|m| m.set(Mutations::default()));
}

pub(crate) fn create_element(tag: &str, namespace: Option<&str>) -> Node {
    record(|m| m.created += 1);
    Node::element_ns(tag, namespace.unwrap_or(HTML_NAMESPACE))
}

pub(crate) fn create_text_node() -> Node {
    record(|m| m.created += 1);
    Node::text("")
}

pub(crate) fn set_attribute(node: &Node, name: &str, value: &str) {
    record(|m| m.attributes_set += 1);
    node.set_attribute(name, value);
}

pub(crate) fn remove_attribute(node: &Node, name: &str) {
    record(|m| m.attributes_removed += 1);
    node.remove_attribute(name);
}

/// Like the browser, registering the same handler for the same event twice
/// is a no-op.
pub(crate) fn add_event_listener(node: &Node, event: &str, handler: &Handler) {
    let mut listeners = node.0.listeners.borrow_mut();
    if listeners.iter().any(|(e, h)| e == event && h == handler) {
        trace!("add_event_listener: `{}` listener {:?} already registered", event, handler);
        return;
    }
    record(|m| m.listeners_added += 1);
    listeners.push((event.to_string(), handler.clone()));
}

pub(crate) fn remove_event_listener(node: &Node, event: &str, handler: &Handler) {
    let mut listeners = node.0.listeners.borrow_mut();
    match listeners
        .iter()
        .position(|(e, h)| e == event && h == handler)
    {
        Some(index) => {
            record(|m| m.listeners_removed += 1);
            listeners.remove(index);
        }
        None => warn!("remove_event_listener: no `{}` listener {:?}", event, handler),
    }
}

pub(crate) fn append_child(parent: &Node, child: &Node) {
    record(|m| m.inserted += 1);
    parent.append_child(child);
}

/// Put `new` in place of `old` under `parent`, or append it when `old` has
/// been moved elsewhere.
pub(crate) fn replace_child(parent: &Node, new: &Node, old: &Node) {
    if parent.replace_child(new, old) {
        record(|m| m.replaced += 1);
    } else {
        warn!("replace_child: {:?} is not a child of {:?}; appending", old, parent);
        append_child(parent, new);
    }
}

pub(crate) fn remove_child(parent: &Node, child: &Node) {
    if parent.remove_child(child) {
        record(|m| m.removed += 1);
    } else {
        warn!("remove_child: {:?} is not a child of {:?}", child, parent);
    }
}

pub(crate) fn set_text_content(node: &Node, text: &str) {
    record(|m| m.text_set += 1);
    node.set_text_content(text);
}

#[inline]
pub(crate) fn namespace_uri(node: &Node) -> Option<String> {
    node.namespace_uri()
}

#[inline]
pub(crate) fn child_nodes(node: &Node) -> Vec<Node> {
    node.children()
}

#[inline]
pub(crate) fn is_text_node(node: &Node) -> bool {
    node.is_text()
}

#[inline]
pub(crate) fn tag_name(node: &Node) -> Option<String> {
    node.tag_name().map(str::to_string)
}

#[inline]
pub(crate) fn text_content(node: &Node) -> String {
    node.text_content()
}

#[inline]
pub(crate) fn parent_node(node: &Node) -> Option<Node> {
    node.parent()
}

/// Remove `child` from `parent` without counting it as a rendering
/// mutation; used when hydration discards whitespace.
pub(crate) fn discard_child(parent: &Node, child: &Node) {
    parent.remove_child(child);
}
