//! Reconciliation: `domify` one tree position, then `render` its attributes,
//! listeners and children.
//!
//! Attribute and text patches, DOM node creation/replacement/removal and
//! `on_update` hooks happen synchronously. `on_mount`/`on_unmount` hooks and
//! listener changes are collected as `Task`s, in preorder, and handed back to
//! the `Vdom` to run when it is flushed.

use crate::arena::{Arena, LiveNode, NodeId};
use crate::dom::{self, Listeners};
use crate::hooks::{HookList, Lifecycle};
use crate::traversal::LiveTraverse;
use crate::vdom::VdomWeak;
use crate::vnode::{NodeRef, Props, VNode};
use smallvec::SmallVec;
use std::cmp;
use std::fmt;
use std::mem;

/// A deferred side effect.
pub(crate) enum Task {
    /// Run a node's `on_mount` or `on_unmount` hooks, in order.
    Hooks { hooks: HookList, cx: Lifecycle },

    /// Detach `old` listeners from `node` and attach `new` ones.
    SwapListeners {
        node: dom::Node,
        old: Listeners,
        new: Listeners,
    },
}

impl Task {
    pub(crate) fn run(self) {
        match self {
            Task::Hooks { hooks, cx } => {
                trace!("Task::run: {} hook(s) for {:?}", hooks.len(), cx.node());
                for hook in &hooks {
                    hook(&cx);
                }
            }
            Task::SwapListeners { node, old, new } => {
                trace!(
                    "Task::run: swapping {} listener(s) for {} on {:?}",
                    old.len(),
                    new.len(),
                    node
                );
                dom::remove_event_listeners(&node, &old);
                dom::add_event_listeners(&node, &new);
            }
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Task::Hooks { hooks, cx } => f
                .debug_struct("Hooks")
                .field("hooks", &hooks.len())
                .field("node", &cx.node())
                .finish(),
            Task::SwapListeners { node, old, new } => f
                .debug_struct("SwapListeners")
                .field("node", node)
                .field("old", old)
                .field("new", new)
                .finish(),
        }
    }
}

/// The work `render` still has to do for a position `domify` kept alive.
struct Patch {
    id: NodeId,
    /// What attributes and children are diffed against: the previous props
    /// and children when the node was reused, empty otherwise.
    old_props: Props,
    old_children: Vec<NodeId>,
    props: Props,
    children: Vec<VNode>,
    refs: SmallVec<[NodeRef; 1]>,
}

/// A live node cut out of the tree, along with its subtree.
struct Garbage {
    id: NodeId,
    node: LiveNode,
}

/// One reconciliation pass over an arena.
pub(crate) struct Reconciler<'a> {
    arena: &'a mut Arena,
    vdom: VdomWeak,
    tasks: Vec<Task>,
    // Bound once the whole pass is done, so that a ref moving between
    // positions is not unbound by a garbage subtree visited later.
    bindings: Vec<(NodeRef, NodeId)>,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(arena: &'a mut Arena, vdom: VdomWeak) -> Reconciler<'a> {
        Reconciler {
            arena,
            vdom,
            tasks: vec![],
            bindings: vec![],
        }
    }

    /// Reconcile the position currently holding `old` with `new`, under the
    /// host node `parent`. Returns the id the position holds afterwards, or
    /// `None` when it was removed.
    ///
    /// # Panics
    ///
    /// Panics when both `old` and `new` are `None`.
    pub(crate) fn render(
        &mut self,
        old: Option<NodeId>,
        new: Option<VNode>,
        parent: &dom::Node,
    ) -> Option<NodeId> {
        let (patch, garbage) = self.domify(old, new, parent);
        if let Some(garbage) = garbage {
            self.collect_garbage(garbage);
        }
        patch.map(|patch| self.patch(patch))
    }

    /// `render` for a position that is known to survive.
    pub(crate) fn render_root(
        &mut self,
        old: Option<NodeId>,
        new: VNode,
        parent: &dom::Node,
    ) -> NodeId {
        match self.render(old, Some(new), parent) {
            Some(id) => id,
            None => unreachable!("rendering a node always leaves a live node behind"),
        }
    }

    /// Bind the refs of every rendered node and return the deferred tasks,
    /// in the order they must run.
    pub(crate) fn finish(self) -> Vec<Task> {
        for (node_ref, id) in self.bindings {
            if self.arena.contains(id) {
                node_ref.bind(&self.vdom, id);
            }
        }
        self.tasks
    }

    fn domify(
        &mut self,
        old: Option<NodeId>,
        new: Option<VNode>,
        parent: &dom::Node,
    ) -> (Option<Patch>, Option<Garbage>) {
        let old = old.filter(|&id| {
            let live = self.arena.contains(id);
            if !live {
                warn!("domify: {:?} is stale; treating the position as empty", id);
            }
            live
        });

        match (old, new) {
            (None, None) => panic!("domify: there is neither an old nor a new node to render"),

            (None, Some(new)) => {
                let dom = dom::create_dom_node(&new.kind, parent);
                trace!("domify: inserting {:?}", new.kind);
                dom::append_child(parent, &dom);
                let (live, patch) = fresh(new, dom);
                let id = self.arena.insert(live);
                (Some(patch(id)), None)
            }

            (Some(old), None) => match self.arena.remove(old) {
                Some(node) => {
                    trace!("domify: removing {:?}", old);
                    dom::remove_child(parent, &node.dom);
                    (None, Some(Garbage { id: old, node }))
                }
                None => (None, None),
            },

            (Some(old), Some(new)) if self.arena[old].kind != new.kind => {
                trace!(
                    "domify: replacing {:?} with {:?} at {:?}",
                    self.arena[old].kind,
                    new.kind,
                    old
                );
                let dom = dom::create_dom_node(&new.kind, parent);
                dom::replace_child(parent, &dom, &self.arena[old].dom);
                let (live, patch) = fresh(new, dom);
                let node = mem::replace(&mut self.arena[old], live);
                (Some(patch(old)), Some(Garbage { id: old, node }))
            }

            (Some(old), Some(new)) => {
                let VNode {
                    props,
                    children,
                    mut hooks,
                    refs,
                    ..
                } = new;
                let live = &mut self.arena[old];
                if !live.hooks.on_unmount.is_empty() {
                    hooks.on_unmount = live.hooks.on_unmount.clone();
                }
                live.hooks = hooks;
                live.life_cycle += 1;
                for stale in live.refs.iter().filter(|r| !refs.iter().any(|n| n.ptr_eq(r))) {
                    stale.unbind();
                }
                live.refs = refs.clone();
                let patch = Patch {
                    id: old,
                    old_props: mem::take(&mut live.props),
                    old_children: mem::take(&mut live.children),
                    props,
                    children,
                    refs,
                };
                (Some(patch), None)
            }
        }
    }

    fn patch(&mut self, patch: Patch) -> NodeId {
        let Patch {
            id,
            old_props,
            old_children,
            props,
            children,
            refs,
        } = patch;
        self.bindings.extend(refs.into_iter().map(|r| (r, id)));

        let live = &self.arena[id];
        let dom = live.dom.clone();
        let life_cycle = live.life_cycle;
        let is_text = live.kind.is_text();

        if life_cycle > 1 && !live.hooks.on_update.is_empty() {
            let hooks = live.hooks.on_update.clone();
            let cx = Lifecycle::new(id, dom.clone(), self.vdom.clone());
            for hook in &hooks {
                hook(&cx);
            }
        }

        update_attributes(&dom, is_text, &old_props, &props);

        if is_text {
            self.arena[id].props = props;
            return id;
        }

        if life_cycle == 1 && !self.arena[id].hooks.on_mount.is_empty() {
            self.tasks.push(Task::Hooks {
                hooks: self.arena[id].hooks.on_mount.clone(),
                cx: Lifecycle::new(id, dom.clone(), self.vdom.clone()),
            });
        }

        let old_listeners = dom::event_listeners(&old_props);
        let new_listeners = dom::event_listeners(&props);
        if old_listeners != new_listeners {
            self.tasks.push(Task::SwapListeners {
                node: dom.clone(),
                old: old_listeners,
                new: new_listeners,
            });
        }
        self.arena[id].props = props;

        let count = cmp::max(old_children.len(), children.len());
        let mut new_children = children.into_iter();
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let old = old_children.get(i).copied();
            if let Some(child) = self.render(old, new_children.next(), &dom) {
                ids.push(child);
            }
        }
        self.arena[id].children = ids;
        id
    }

    /// Queue the `on_unmount` hooks of a discarded subtree, in preorder, and
    /// free every id inside it. The subtree root's own id is freed by the
    /// caller when the position went away.
    fn collect_garbage(&mut self, garbage: Garbage) {
        let Garbage { id, node } = garbage;
        discard(&mut self.tasks, &self.vdom, id, &node);

        let mut doomed = vec![];
        for (child, live) in LiveTraverse::new(self.arena, &node.children) {
            discard(&mut self.tasks, &self.vdom, child, live);
            doomed.push(child);
        }
        trace!("collect_garbage: freeing {} descendant(s) of {:?}", doomed.len(), id);
        for child in doomed {
            self.arena.remove(child);
        }
    }
}

/// Split a new virtual node into a live node that starts its life with an
/// empty baseline, and the patch that will fill it in once it has an id.
fn fresh(new: VNode, dom: dom::Node) -> (LiveNode, impl FnOnce(NodeId) -> Patch) {
    let VNode {
        kind,
        props,
        children,
        hooks,
        refs,
    } = new;
    let live = LiveNode {
        kind,
        props: Props::new(),
        children: vec![],
        life_cycle: 1,
        dom,
        hooks,
        refs: refs.clone(),
    };
    let patch = move |id| Patch {
        id,
        old_props: Props::new(),
        old_children: vec![],
        props,
        children,
        refs,
    };
    (live, patch)
}

fn discard(tasks: &mut Vec<Task>, vdom: &VdomWeak, id: NodeId, node: &LiveNode) {
    for node_ref in &node.refs {
        node_ref.unbind();
    }
    if !node.hooks.on_unmount.is_empty() {
        tasks.push(Task::Hooks {
            hooks: node.hooks.on_unmount.clone(),
            cx: Lifecycle::new(id, node.dom.clone(), vdom.clone()),
        });
    }
    let listeners = dom::event_listeners(&node.props);
    if !listeners.is_empty() {
        tasks.push(Task::SwapListeners {
            node: node.dom.clone(),
            old: listeners,
            new: vec![],
        });
    }
}

/// Patch `node`'s attributes (or text content) from `old` to `new`.
///
/// Nothing is touched when the two prop sets are shallowly equal.
pub(crate) fn update_attributes(node: &dom::Node, is_text: bool, old: &Props, new: &Props) {
    if old.shallow_eq(new) {
        return;
    }
    if is_text {
        dom::set_text_node(node, new.get("value"));
        return;
    }
    let to_remove = old
        .iter()
        .filter(|(key, value)| value.as_handler().is_none() && !new.contains_key(key))
        .map(|(key, _)| key);
    dom::remove_attributes(node, to_remove);
    dom::set_attributes(node, new.iter());
}
