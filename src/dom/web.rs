//! The browser DOM, through `web-sys`.

use crate::vnode::Handler;
use fxhash::FxHashMap;
use std::cell::RefCell;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub use web_sys::{Event, Node};

/// A JS function wrapping a `Handler`, shared by every node the handler is
/// attached to for the same event.
struct Registered {
    closure: Closure<dyn Fn(web_sys::Event)>,
    count: usize,
}

thread_local! {
    static DOCUMENT: web_sys::Document = web_sys::window()
        .expect_throw("should have a `window`")
        .document()
        .expect_throw("should have a `document` on the `window`");

    // Keyed by handler address. The closure keeps the handler alive, so the
    // address is not reused while the entry exists.
    static LISTENERS: RefCell<FxHashMap<(usize, String), Registered>> =
        RefCell::new(FxHashMap::default());
}

pub(crate) fn create_element(tag: &str, namespace: Option<&str>) -> Node {
    DOCUMENT.with(|document| {
        let element = match namespace {
            Some(ns) => document.create_element_ns(Some(ns), tag),
            None => document.create_element(tag),
        };
        element.expect_throw("failed to create element").into()
    })
}

pub(crate) fn create_text_node() -> Node {
    DOCUMENT.with(|document| document.create_text_node("").into())
}

pub(crate) fn set_attribute(node: &Node, name: &str, value: &str) {
    if let Err(e) = node.unchecked_ref::<web_sys::Element>().set_attribute(name, value) {
        warn!("set_attribute: failed to set `{}`: {:?}", name, e);
    }
}

pub(crate) fn remove_attribute(node: &Node, name: &str) {
    if let Err(e) = node.unchecked_ref::<web_sys::Element>().remove_attribute(name) {
        warn!("remove_attribute: failed to remove `{}`: {:?}", name, e);
    }
}

pub(crate) fn add_event_listener(node: &Node, event: &str, handler: &Handler) {
    LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        let entry = listeners
            .entry((handler.addr(), event.to_string()))
            .or_insert_with(|| {
                let handler = handler.clone();
                Registered {
                    closure: Closure::wrap(Box::new(move |event: web_sys::Event| handler.call(&event))
                        as Box<dyn Fn(web_sys::Event)>),
                    count: 0,
                }
            });
        entry.count += 1;
        if let Err(e) =
            node.add_event_listener_with_callback(event, entry.closure.as_ref().unchecked_ref())
        {
            warn!("add_event_listener: failed to listen for `{}`: {:?}", event, e);
        }
    })
}

pub(crate) fn remove_event_listener(node: &Node, event: &str, handler: &Handler) {
    LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        let key = (handler.addr(), event.to_string());
        let entry = match listeners.get_mut(&key) {
            Some(entry) => entry,
            None => {
                warn!("remove_event_listener: no `{}` listener {:?}", event, handler);
                return;
            }
        };
        if let Err(e) =
            node.remove_event_listener_with_callback(event, entry.closure.as_ref().unchecked_ref())
        {
            warn!("remove_event_listener: failed for `{}`: {:?}", event, e);
        }
        entry.count -= 1;
        if entry.count == 0 {
            listeners.remove(&key);
        }
    })
}

pub(crate) fn append_child(parent: &Node, child: &Node) {
    if let Err(e) = parent.append_child(child) {
        warn!("append_child: {:?}", e);
    }
}

fn is_child_of(child: &Node, parent: &Node) -> bool {
    child
        .parent_node()
        .map_or(false, |p| p.is_same_node(Some(parent)))
}

pub(crate) fn replace_child(parent: &Node, new: &Node, old: &Node) {
    if !is_child_of(old, parent) {
        warn!("replace_child: old node is not a child of its parent; appending");
        append_child(parent, new);
        return;
    }
    if let Err(e) = parent.replace_child(new, old) {
        warn!("replace_child: {:?}", e);
    }
}

pub(crate) fn remove_child(parent: &Node, child: &Node) {
    if !is_child_of(child, parent) {
        warn!("remove_child: node is not a child of its parent");
        return;
    }
    if let Err(e) = parent.remove_child(child) {
        warn!("remove_child: {:?}", e);
    }
}

pub(crate) fn discard_child(parent: &Node, child: &Node) {
    remove_child(parent, child)
}

pub(crate) fn set_text_content(node: &Node, text: &str) {
    node.set_text_content(Some(text));
}

pub(crate) fn namespace_uri(node: &Node) -> Option<String> {
    node.dyn_ref::<web_sys::Element>()
        .and_then(web_sys::Element::namespace_uri)
}

pub(crate) fn child_nodes(node: &Node) -> Vec<Node> {
    let list = node.child_nodes();
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

pub(crate) fn is_text_node(node: &Node) -> bool {
    node.node_type() == Node::TEXT_NODE
}

pub(crate) fn tag_name(node: &Node) -> Option<String> {
    node.dyn_ref::<web_sys::Element>()
        .map(web_sys::Element::local_name)
}

pub(crate) fn text_content(node: &Node) -> String {
    node.text_content().unwrap_or_default()
}

pub(crate) fn parent_node(node: &Node) -> Option<Node> {
    node.parent_node()
}

/// Run `f` on a fresh macrotask.
pub(crate) fn set_timeout<F>(f: F)
where
    F: 'static + FnOnce(),
{
    let window = web_sys::window().expect_throw("should have a `window`");
    let callback = Closure::once_into_js(f);
    if let Err(e) = window.set_timeout_with_callback(callback.unchecked_ref()) {
        warn!("set_timeout: {:?}", e);
    }
}
