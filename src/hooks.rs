//! Lifecycle hooks.
//!
//! `on_mount`, `on_unmount` and `on_update` wrap a component so that the node
//! it renders carries an extra callback. Each hook kind keeps an ordered list,
//! so wrapping a component twice runs both callbacks, inner one first.
//!
//! `on_mount` and `on_unmount` callbacks are deferred: they run when the
//! `Vdom` is flushed, after the synchronous DOM mutations. `on_update` runs
//! synchronously, right before the node's attributes are patched, for every
//! render of the node except the first.

use crate::arena::NodeId;
use crate::builder::{resolve, Component};
use crate::dom;
use crate::vdom::VdomWeak;
use crate::vnode::Value;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

/// A lifecycle callback.
pub type Hook = Rc<dyn Fn(&Lifecycle)>;

pub(crate) type HookList = SmallVec<[Hook; 1]>;

/// The hooks attached to a node.
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) on_mount: HookList,
    pub(crate) on_unmount: HookList,
    pub(crate) on_update: HookList,
}

impl Hooks {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.on_mount.is_empty() && self.on_unmount.is_empty() && self.on_update.is_empty()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_mount", &self.on_mount.len())
            .field("on_unmount", &self.on_unmount.len())
            .field("on_update", &self.on_update.len())
            .finish()
    }
}

/// What a hook gets to see: the node it is attached to.
///
/// For `on_unmount`, the node has already been removed from the tree (or its
/// position was taken over by a replacement), so only the host node is
/// meaningful.
#[derive(Clone)]
pub struct Lifecycle {
    node: NodeId,
    dom: dom::Node,
    vdom: VdomWeak,
}

impl Lifecycle {
    pub(crate) fn new(node: NodeId, dom: dom::Node, vdom: VdomWeak) -> Lifecycle {
        Lifecycle { node, dom, vdom }
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn dom(&self) -> &dom::Node {
        &self.dom
    }

    #[inline]
    pub fn vdom(&self) -> &VdomWeak {
        &self.vdom
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("node", &self.node)
            .field("dom", &self.dom)
            .finish()
    }
}

fn register<F>(select: fn(&mut Hooks) -> &mut HookList, callback: F, component: Component) -> Component
where
    F: 'static + Fn(&Lifecycle, &[Value]),
{
    let callback = Rc::new(callback);
    Component::with_args(move |props, args| {
        let mut node = resolve(component.call(props, args), props);
        let callback = callback.clone();
        let args: Rc<[Value]> = args.into();
        select(&mut node.hooks).push(Rc::new(move |cx: &Lifecycle| callback(cx, &args)));
        node
    })
}

fn mount_hooks(hooks: &mut Hooks) -> &mut HookList {
    &mut hooks.on_mount
}

fn unmount_hooks(hooks: &mut Hooks) -> &mut HookList {
    &mut hooks.on_unmount
}

fn update_hooks(hooks: &mut Hooks) -> &mut HookList {
    &mut hooks.on_update
}

/// Run `callback` after the node rendered by `component` is first inserted.
pub fn on_mount<F>(callback: F, component: Component) -> Component
where
    F: 'static + Fn(&Lifecycle, &[Value]),
{
    register(mount_hooks, callback, component)
}

/// Run `callback` after the node rendered by `component` is removed or
/// replaced.
pub fn on_unmount<F>(callback: F, component: Component) -> Component
where
    F: 'static + Fn(&Lifecycle, &[Value]),
{
    register(unmount_hooks, callback, component)
}

/// Run `callback` synchronously whenever the node rendered by `component` is
/// patched in place.
pub fn on_update<F>(callback: F, component: Component) -> Component
where
    F: 'static + Fn(&Lifecycle, &[Value]),
{
    register(update_hooks, callback, component)
}
