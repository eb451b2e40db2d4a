//! Local component state.
//!
//! `with_state` gives every invocation of a component its own `State<S>`.
//! Setting the state re-renders just that instance, in place, through the
//! node it rendered. Re-rendering the parent invokes the component again and
//! so starts over from the initial value; `with_idempotent_state` instead
//! keeps one state per `key` prop across parent re-renders.

use crate::arena::NodeId;
use crate::builder::Component;
use crate::error::VdomResult;
use crate::hooks::Lifecycle;
use crate::vnode::{NodeRef, Props, VNode};
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type View<S> = Rc<dyn Fn(&Props, &State<S>) -> VNode>;

/// One component instance's state.
pub struct State<S> {
    inner: Rc<StateInner<S>>,
}

struct StateInner<S> {
    value: RefCell<S>,
    node: NodeRef,
    // What the instance was last rendered with, reused when the state changes.
    props: RefCell<Props>,
    view: View<S>,
}

impl<S> Clone for State<S> {
    fn clone(&self) -> State<S> {
        State {
            inner: self.inner.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for State<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &self.inner.value)
            .field("node", &self.inner.node)
            .finish()
    }
}

impl<S: 'static> State<S> {
    fn new(value: S, view: View<S>) -> State<S> {
        State {
            inner: Rc::new(StateInner {
                value: RefCell::new(value),
                node: NodeRef::new(),
                props: RefCell::new(Props::new()),
                view,
            }),
        }
    }

    /// A copy of the current value.
    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and re-render the instance.
    pub fn set(&self, value: S) -> VdomResult<()> {
        *self.inner.value.borrow_mut() = value;
        self.rerender()
    }

    /// Modify the value in place and re-render the instance.
    pub fn update(&self, f: impl FnOnce(&mut S)) -> VdomResult<()> {
        f(&mut self.inner.value.borrow_mut());
        self.rerender()
    }

    /// The node this instance is rendered as, once mounted.
    pub fn node(&self) -> Option<NodeId> {
        self.inner.node.get()
    }

    /// Whether the instance is currently rendered.
    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.inner.node.is_bound()
    }

    fn render(&self, props: &Props) -> VNode {
        *self.inner.props.borrow_mut() = props.clone();
        (self.inner.view)(props, self).with_ref(self.inner.node.clone())
    }

    fn rerender(&self) -> VdomResult<()> {
        let state = self.clone();
        let component = Component::new(move |props: &Props| state.render(props));
        let updater = match self.inner.node.updater(&component) {
            Some(updater) => updater,
            // Not rendered yet: the next render picks the value up.
            None => return Ok(()),
        };
        let props = self.inner.props.borrow().clone();
        updater.update(props).map(|_| ())
    }
}

/// Give each invocation of `view` its own state, starting at `initial`.
///
/// ```
/// use twig::{h, with_state, Props};
///
/// let counter = with_state(0, |_props: &Props, count| {
///     let state = count.clone();
///     h(
///         "button",
///         Props::new().on("click", move |_| {
///             let _ = state.update(|n| *n += 1);
///         }),
///         count.get(),
///     )
/// });
/// # let _ = counter;
/// ```
pub fn with_state<S, F>(initial: S, view: F) -> Component
where
    S: 'static + Clone,
    F: 'static + Fn(&Props, &State<S>) -> VNode,
{
    let view: View<S> = Rc::new(view);
    Component::new(move |props: &Props| State::new(initial.clone(), view.clone()).render(props))
}

/// Like `with_state`, but instances are identified by their `key` prop: a
/// re-rendered parent gets back the state its child had under the same key.
///
/// A key's state is forgotten once no rendered node uses it. Invocations
/// without a `key` prop get a fresh state each time.
pub fn with_idempotent_state<S, F>(initial: S, view: F) -> Component
where
    S: 'static + Clone,
    F: 'static + Fn(&Props, &State<S>) -> VNode,
{
    let view: View<S> = Rc::new(view);
    let cache: Rc<RefCell<FxHashMap<String, State<S>>>> = Default::default();

    Component::new(move |props: &Props| {
        let key = match props.get("key") {
            Some(key) => key.to_string(),
            None => {
                warn!("with_idempotent_state: invoked without a `key` prop");
                return State::new(initial.clone(), view.clone()).render(props);
            }
        };

        let state = cache
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| State::new(initial.clone(), view.clone()))
            .clone();
        let mut node = state.render(props);

        // Positions are diffed by index, so the hook that ends up running is
        // not necessarily this key's: sweep every state that lost its node.
        let cache = Rc::downgrade(&cache);
        node.hooks.on_unmount.push(Rc::new(move |_: &Lifecycle| {
            if let Some(cache) = cache.upgrade() {
                cache.borrow_mut().retain(|_, state| state.is_mounted());
            }
        }));
        node
    })
}
