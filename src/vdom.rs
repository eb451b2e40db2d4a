use crate::arena::{Arena, LiveNode, NodeId};
use crate::builder::Component;
use crate::diff::{Reconciler, Task};
use crate::dom;
use crate::error::{VdomError, VdomResult};
use crate::hydrate::hydrate;
use crate::vnode::{Kind, NodeRef, Props, VNode, Value};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::mem;
use std::rc::{Rc, Weak};

/// A strong handle to a virtual DOM: the arena of live nodes for every tree
/// mounted through it, plus the queue of deferred side effects those trees
/// produced.
///
/// Dropping it leaves the host DOM as it is, but every `Updater`, `VdomWeak`
/// and `NodeRef` pointing into it stops working. To keep it alive for the rest
/// of the program, use `Vdom::forget`.
#[must_use = "A `Vdom` only keeps its trees updatable while it has not been dropped. \
              If you want a `Vdom` to live forever, call `Vdom::forget`."]
#[derive(Debug)]
pub struct Vdom {
    inner: Rc<VdomInner>,
}

/// A weak handle to a virtual DOM.
///
/// Does not keep the virtual DOM alive: only the original `Vdom` does that.
#[derive(Clone, Debug)]
pub struct VdomWeak {
    inner: Weak<VdomInner>,
}

#[derive(Debug, Default)]
pub(crate) struct VdomInner {
    arena: RefCell<Arena>,
    // One batch per `mount`/`update`/`unmount`, oldest first.
    pending: RefCell<VecDeque<Vec<Task>>>,
    flushing: Cell<bool>,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    tick_scheduled: Cell<bool>,
}

/// Something that can be mounted: a component, called with the mount props,
/// or an already built node.
pub trait Mountable {
    fn into_vnode(self, props: Props) -> VNode;
}

impl Mountable for VNode {
    #[inline]
    fn into_vnode(self, _props: Props) -> VNode {
        self
    }
}

impl Mountable for Component {
    #[inline]
    fn into_vnode(self, props: Props) -> VNode {
        self.invoke(&props, &[])
    }
}

impl Mountable for &Component {
    #[inline]
    fn into_vnode(self, props: Props) -> VNode {
        self.invoke(&props, &[])
    }
}

impl Default for Vdom {
    fn default() -> Vdom {
        Vdom::new()
    }
}

impl Vdom {
    /// Create an empty virtual DOM.
    pub fn new() -> Vdom {
        Vdom {
            inner: Rc::new(VdomInner::default()),
        }
    }

    /// Get a weak handle to this virtual DOM.
    #[inline]
    pub fn weak(&self) -> VdomWeak {
        VdomWeak {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Keep this virtual DOM alive until the program ends.
    #[inline]
    pub fn forget(self) {
        mem::forget(self);
    }

    /// Render `component` into `root` and return the id of the rendered
    /// root node.
    ///
    /// When `root` already holds markup, it is hydrated instead of being
    /// rendered from scratch: its first non-blank child is adopted as the root
    /// node. The DOM is complete when this returns; `on_mount` hooks and
    /// listener attachment wait for the next `flush`.
    pub fn mount<C, P>(&self, component: C, props: P, root: &dom::Node) -> VdomResult<NodeId>
    where
        C: Mountable,
        P: Into<Props>,
    {
        let vnode = component.into_vnode(props.into());
        let mut arena = self.arena_mut()?;
        let hydrated = hydrate(&mut *arena, &vnode, root);
        let mut reconciler = Reconciler::new(&mut *arena, self.weak());
        let id = reconciler.render_root(hydrated, vnode, root);
        let tasks = reconciler.finish();
        drop(arena);

        debug!(
            "Vdom::mount: mounted {:?}{} with {} deferred task(s)",
            id,
            if hydrated.is_some() { " by hydration" } else { "" },
            tasks.len()
        );
        self.schedule(tasks);
        Ok(id)
    }

    /// Get an `Updater` that re-renders the node `id` with `component`.
    pub fn updater(&self, component: &Component, id: NodeId) -> Updater {
        self.weak().updater(component, id)
    }

    /// Remove the mounted tree rooted at `id` from the DOM. Its `on_unmount`
    /// hooks run on the next `flush`.
    pub fn unmount(&self, id: NodeId) -> VdomResult<()> {
        let mut arena = self.arena_mut()?;
        let parent = match arena.get(id) {
            Some(live) => dom::parent_node(&live.dom).ok_or(VdomError::Detached(id))?,
            None => return Err(VdomError::StaleNode(id)),
        };
        let mut reconciler = Reconciler::new(&mut *arena, self.weak());
        reconciler.render(Some(id), None, &parent);
        let tasks = reconciler.finish();
        drop(arena);

        debug!("Vdom::unmount: unmounted {:?}", id);
        self.schedule(tasks);
        Ok(())
    }

    /// Run every deferred task, oldest batch first, including batches
    /// scheduled by the tasks themselves. Returns how many tasks ran.
    ///
    /// Calling `flush` from inside a running task does nothing: the outer
    /// call picks up whatever was scheduled.
    pub fn flush(&self) -> usize {
        if self.inner.flushing.replace(true) {
            trace!("Vdom::flush: already flushing");
            return 0;
        }
        let _guard = FlushGuard(&self.inner.flushing);

        let mut count = 0;
        loop {
            let batch = self.inner.pending.borrow_mut().pop_front();
            let batch = match batch {
                Some(batch) => batch,
                None => break,
            };
            for task in batch {
                task.run();
                count += 1;
            }
        }

        if count > 0 {
            debug!("Vdom::flush: ran {} deferred task(s)", count);
        }
        count
    }

    /// The number of deferred tasks waiting for `flush`.
    pub fn pending(&self) -> usize {
        self.inner.pending.borrow().iter().map(Vec::len).sum()
    }

    /// The number of live nodes.
    pub fn len(&self) -> usize {
        self.arena().map_or(0, |arena| arena.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena().map_or(false, |arena| arena.contains(id))
    }

    /// `1` after the node at `id` was inserted, plus one for every in-place
    /// patch since. `None` for stale ids, and while a render is in progress.
    pub fn life_cycle(&self, id: NodeId) -> Option<u32> {
        self.with_node(id, |live| live.life_cycle)
    }

    pub fn kind(&self, id: NodeId) -> Option<Kind> {
        self.with_node(id, |live| live.kind.clone())
    }

    /// The props the node at `id` was last rendered with.
    pub fn props(&self, id: NodeId) -> Option<Props> {
        self.with_node(id, |live| live.props.clone())
    }

    pub fn children(&self, id: NodeId) -> Option<Vec<NodeId>> {
        self.with_node(id, |live| live.children.clone())
    }

    /// The host node backing `id`.
    pub fn dom_node(&self, id: NodeId) -> Option<dom::Node> {
        self.with_node(id, |live| live.dom.clone())
    }

    fn with_node<T>(&self, id: NodeId, f: impl FnOnce(&LiveNode) -> T) -> Option<T> {
        self.arena().ok()?.get(id).map(f)
    }

    fn arena(&self) -> VdomResult<Ref<Arena>> {
        self.inner.arena.try_borrow().map_err(|_| VdomError::Busy)
    }

    fn arena_mut(&self) -> VdomResult<RefMut<Arena>> {
        self.inner.arena.try_borrow_mut().map_err(|_| VdomError::Busy)
    }

    fn update(
        &self,
        component: &Component,
        id: NodeId,
        props: Props,
        args: &[Value],
    ) -> VdomResult<NodeId> {
        // The live tree is the source of truth for where this node renders.
        let (parent, mut merged) = {
            let arena = self.arena()?;
            let live = arena.get(id).ok_or(VdomError::StaleNode(id))?;
            let parent = dom::parent_node(&live.dom).ok_or(VdomError::Detached(id))?;
            (parent, live.props.clone())
        };
        merged.extend(props);

        // The arena is not borrowed while the component runs, so it may read
        // from this virtual DOM.
        let vnode = component.invoke(&merged, args);

        let mut arena = self.arena_mut()?;
        if !arena.contains(id) {
            return Err(VdomError::StaleNode(id));
        }
        let mut reconciler = Reconciler::new(&mut *arena, self.weak());
        let new_id = reconciler.render_root(Some(id), vnode, &parent);
        debug_assert_eq!(new_id, id);
        let tasks = reconciler.finish();
        drop(arena);

        debug!(
            "Vdom::update: re-rendered {:?} with {} deferred task(s)",
            id,
            tasks.len()
        );
        self.schedule(tasks);
        Ok(id)
    }

    fn schedule(&self, tasks: Vec<Task>) {
        if tasks.is_empty() {
            return;
        }
        trace!("Vdom::schedule: queueing {} task(s)", tasks.len());
        self.inner.pending.borrow_mut().push_back(tasks);
        self.arm_tick();
    }
}

// Clears the flushing flag on the way out of `flush`, also when a task
// panics, so the batches after it can still be drained.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        impl Vdom {
            // Drain the queue on the next macrotask, once the current call
            // stack has unwound and the browser has had a chance to paint.
            fn arm_tick(&self) {
                if self.inner.tick_scheduled.replace(true) {
                    return;
                }
                let vdom = self.weak();
                dom::set_timeout(move || match vdom.upgrade() {
                    Ok(vdom) => {
                        vdom.inner.tick_scheduled.set(false);
                        vdom.flush();
                    }
                    Err(_) => warn!("Vdom: dropped before its deferred tasks could run"),
                });
            }
        }
    } else {
        impl Vdom {
            // Without an event loop, the host drains the queue with `flush`.
            #[inline]
            fn arm_tick(&self) {}
        }
    }
}

impl VdomWeak {
    /// Get a strong handle, if the virtual DOM is still alive.
    pub fn upgrade(&self) -> VdomResult<Vdom> {
        self.inner
            .upgrade()
            .map(|inner| Vdom { inner })
            .ok_or(VdomError::Dropped)
    }

    /// Run every pending deferred task. See `Vdom::flush`.
    pub fn flush(&self) -> VdomResult<usize> {
        self.upgrade().map(|vdom| vdom.flush())
    }

    /// Get an `Updater` that re-renders the node `id` with `component`.
    pub fn updater(&self, component: &Component, id: NodeId) -> Updater {
        Updater {
            vdom: self.clone(),
            component: component.clone(),
            node: id,
        }
    }
}

/// Re-renders one mounted node with one component.
///
/// The node keeps its id across updates, including when the component starts
/// rendering a different kind of node; anything holding the id sees the
/// latest render.
#[derive(Clone, Debug)]
pub struct Updater {
    vdom: VdomWeak,
    component: Component,
    node: NodeId,
}

impl Updater {
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn vdom(&self) -> &VdomWeak {
        &self.vdom
    }

    /// Call the component with the node's current props overlaid by `props`,
    /// and patch the DOM with the result.
    pub fn update<P: Into<Props>>(&self, props: P) -> VdomResult<NodeId> {
        self.update_with_args(props, &[])
    }

    /// Like `update`, also forwarding positional `args` to the component.
    pub fn update_with_args<P: Into<Props>>(&self, props: P, args: &[Value]) -> VdomResult<NodeId> {
        let vdom = self.vdom.upgrade()?;
        vdom.update(&self.component, self.node, props.into(), args)
    }
}

impl NodeRef {
    /// An `Updater` for the node this ref is bound to, if any.
    pub fn updater(&self, component: &Component) -> Option<Updater> {
        let vdom = self.vdom()?;
        let node = self.get()?;
        Some(vdom.updater(component, node))
    }
}
