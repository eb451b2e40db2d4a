//! A small observable store, and `connect` for components that render a
//! slice of it.

use crate::builder::Component;
use crate::hooks::Lifecycle;
use crate::vnode::{NodeRef, Props, VNode};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Subscriber<T> = Rc<dyn Fn(&T)>;

/// Shared application state that notifies subscribers whenever it changes.
pub struct Store<T> {
    inner: Rc<StoreInner<T>>,
}

struct StoreInner<T> {
    state: RefCell<T>,
    subscribers: RefCell<Vec<(u64, Subscriber<T>)>>,
    next_id: Cell<u64>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Store<T> {
        Store {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state)
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T: 'static> Store<T> {
    pub fn new(state: T) -> Store<T> {
        Store {
            inner: Rc::new(StoreInner {
                state: RefCell::new(state),
                subscribers: RefCell::new(vec![]),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.state.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Replace the state and notify every subscriber.
    pub fn set(&self, state: T) {
        *self.inner.state.borrow_mut() = state;
        self.notify();
    }

    /// Modify the state in place and notify every subscriber.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.state.borrow_mut());
        self.notify();
    }

    /// Call `f` with the new state after every change, until the returned
    /// `Subscription` is dropped.
    ///
    /// Subscribers must not change the store themselves.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: 'static + Fn(&T),
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.subscribers.borrow_mut().push((id, Rc::new(f)));

        let store = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(store) = store.upgrade() {
                    store.subscribers.borrow_mut().retain(|(i, _)| *i != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn notify(&self) {
        // Subscribers may unsubscribe while being notified.
        let subscribers: Vec<_> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, s)| s.clone())
            .collect();
        trace!("Store::notify: {} subscriber(s)", subscribers.len());
        let state = self.inner.state.borrow();
        for subscriber in subscribers {
            subscriber(&state);
        }
    }
}

/// Keeps a `Store` subscription alive. Dropping it unsubscribes.
#[must_use = "dropping a `Subscription` unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    #[inline]
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

/// One rendered instance of a connected component.
struct Connected<U> {
    last: RefCell<U>,
    props: RefCell<Props>,
    node: NodeRef,
    subscription: RefCell<Option<Subscription>>,
}

/// Render `view` with `slice(&state)`, and re-render whenever the store
/// changes such that the slice is no longer equal to the one last rendered.
pub fn connect<T, U, S, F>(store: &Store<T>, slice: S, view: F) -> Component
where
    T: 'static,
    U: 'static + PartialEq,
    S: 'static + Fn(&T) -> U,
    F: 'static + Fn(&Props, &U) -> VNode,
{
    connect_with(store, slice, |old: &U, new: &U| old != new, view)
}

/// `connect` with a custom predicate: the instance re-renders when
/// `should_update(last_rendered, new)` returns `true`.
///
/// The instance subscribes when its node is mounted and unsubscribes when it
/// is unmounted.
pub fn connect_with<T, U, S, P, F>(store: &Store<T>, slice: S, should_update: P, view: F) -> Component
where
    T: 'static,
    U: 'static,
    S: 'static + Fn(&T) -> U,
    P: 'static + Fn(&U, &U) -> bool,
    F: 'static + Fn(&Props, &U) -> VNode,
{
    let connector = Rc::new(Connector {
        store: store.clone(),
        slice,
        should_update,
        view,
    });
    Component::new(move |props: &Props| {
        let instance = Rc::new(Connected {
            last: RefCell::new(connector.store.with(|state| (connector.slice)(state))),
            props: RefCell::new(Props::new()),
            node: NodeRef::new(),
            subscription: RefCell::new(None),
        });
        Connector::render(&connector, &instance, props)
    })
}

struct Connector<T, S, P, F> {
    store: Store<T>,
    slice: S,
    should_update: P,
    view: F,
}

impl<T, U, S, P, F> Connector<T, S, P, F>
where
    T: 'static,
    U: 'static,
    S: 'static + Fn(&T) -> U,
    P: 'static + Fn(&U, &U) -> bool,
    F: 'static + Fn(&Props, &U) -> VNode,
{
    fn render(this: &Rc<Self>, instance: &Rc<Connected<U>>, props: &Props) -> VNode {
        *instance.props.borrow_mut() = props.clone();
        let mut node =
            (this.view)(props, &instance.last.borrow()).with_ref(instance.node.clone());

        let (c, i) = (this.clone(), instance.clone());
        node.hooks
            .on_mount
            .push(Rc::new(move |_: &Lifecycle| Connector::subscribe(&c, &i)));
        // A re-render that replaced the node runs `on_unmount` then `on_mount`
        // again; one that patched it in place only runs `on_update`.
        let (c, i) = (this.clone(), instance.clone());
        node.hooks
            .on_update
            .push(Rc::new(move |_: &Lifecycle| Connector::subscribe(&c, &i)));
        let i = instance.clone();
        node.hooks.on_unmount.push(Rc::new(move |_: &Lifecycle| {
            i.subscription.borrow_mut().take();
        }));
        node
    }

    fn subscribe(this: &Rc<Self>, instance: &Rc<Connected<U>>) {
        if instance.subscription.borrow().is_some() {
            return;
        }
        let connector = Rc::downgrade(this);
        let weak = Rc::downgrade(instance);
        let subscription = this.store.subscribe(move |state| {
            if let (Some(connector), Some(instance)) = (connector.upgrade(), weak.upgrade()) {
                Connector::changed(&connector, &instance, state);
            }
        });
        *instance.subscription.borrow_mut() = Some(subscription);
    }

    fn changed(this: &Rc<Self>, instance: &Rc<Connected<U>>, state: &T) {
        // Replaced by a newer instance at the same position.
        if !instance.node.is_bound() {
            instance.subscription.borrow_mut().take();
            return;
        }

        let next = (this.slice)(state);
        if !(this.should_update)(&instance.last.borrow(), &next) {
            return;
        }
        *instance.last.borrow_mut() = next;

        let (c, i) = (this.clone(), instance.clone());
        let component = Component::new(move |props: &Props| Connector::render(&c, &i, props));
        if let Some(updater) = instance.node.updater(&component) {
            let props = instance.props.borrow().clone();
            if let Err(e) = updater.update(props) {
                warn!("connect: failed to re-render after a store change: {}", e);
            }
        }
    }
}
