//! DOM utilities.
//!
//! The reconciler only ever touches the host through the primitives below:
//! node creation, attributes, listeners and text content. They are built on a
//! small host façade that is implemented twice: by `web-sys` on `wasm32`, and
//! by the in-memory document in [`memory`] everywhere else.

use crate::vnode::{Handler, Kind, Props, Value};
use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        mod web;
        pub(crate) use self::web::*;
        pub use self::web::{Event, Node};
    } else {
        pub mod memory;
        pub(crate) use self::memory::*;
        pub use self::memory::{Event, Node};
    }
}

/// The namespace elements under (and including) `<svg>` are created in.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// `(event name, handler)` pairs, sorted for comparison.
pub(crate) type Listeners = Vec<(String, Handler)>;

/// Create the host node for a virtual node of the given kind, about to be
/// inserted under `parent`.
///
/// Text nodes start out empty: their content is set when their props are
/// applied. `svg` elements are created in the SVG namespace, and so is any
/// element whose parent is in it.
pub(crate) fn create_dom_node(kind: &Kind, parent: &Node) -> Node {
    match kind {
        Kind::Text => create_text_node(),
        Kind::Element(tag) if &**tag == "svg" => create_element(tag, Some(SVG_NAMESPACE)),
        Kind::Element(tag) => {
            let namespace = namespace_uri(parent).filter(|ns| ns == SVG_NAMESPACE);
            create_element(tag, namespace.as_deref())
        }
    }
}

/// Set every non-handler value as an attribute. `false` removes the
/// attribute instead, so boolean attributes can be switched off.
pub(crate) fn set_attributes<'a, I>(node: &Node, pairs: I)
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    for (name, value) in pairs {
        match value {
            Value::Handler(_) => continue,
            Value::Bool(false) => remove_attribute(node, name),
            value => set_attribute(node, name, &value.to_string()),
        }
    }
}

pub(crate) fn remove_attributes<'a, I>(node: &Node, names: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for name in names {
        remove_attribute(node, name);
    }
}

/// Every `on*` prop holding a handler, as `(lower-cased event name, handler)`:
/// `onClick` listens for `click`.
pub(crate) fn event_listeners(props: &Props) -> Listeners {
    let mut listeners: Listeners = props
        .iter()
        .filter(|(key, _)| key.len() > 2 && key.starts_with("on"))
        .filter_map(|(key, value)| {
            value
                .as_handler()
                .map(|handler| (key[2..].to_lowercase(), handler.clone()))
        })
        .collect();
    listeners.sort_by(|(a, x), (b, y)| a.cmp(b).then(x.addr().cmp(&y.addr())));
    listeners
}

pub(crate) fn add_event_listeners(node: &Node, listeners: &[(String, Handler)]) {
    for (event, handler) in listeners {
        add_event_listener(node, event, handler);
    }
}

pub(crate) fn remove_event_listeners(node: &Node, listeners: &[(String, Handler)]) {
    for (event, handler) in listeners {
        remove_event_listener(node, event, handler);
    }
}

/// Replace a text node's content with the string form of `value`.
pub(crate) fn set_text_node(node: &Node, value: Option<&Value>) {
    let text = value.map(Value::to_string).unwrap_or_default();
    set_text_content(node, &text);
}
