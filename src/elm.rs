//! The Elm architecture: one model, a table of named update functions, and a
//! view of the whole model. Every dispatched action replaces the model and
//! re-renders the root once.
//!
//! ## Example
//!
//! ```
//! use twig::dom::Node;
//! use twig::{elm, h, Props, Updates, Value, Vdom};
//!
//! # #[cfg(not(target_arch = "wasm32"))]
//! # fn main() -> Result<(), twig::VdomError> {
//! let updates = Updates::new()
//!     .on("add", |count: &i64, args: &[Value]| {
//!         count + args.first().and_then(Value::as_int).unwrap_or(1)
//!     });
//!
//! let counter = elm(0, updates, |count, _dispatch| h("output", (), *count));
//!
//! let root = Node::element("div");
//! let vdom = Vdom::new();
//! counter.mount(&vdom, &root)?;
//! counter.dispatcher().dispatch("add", &[Value::from(41)])?;
//! counter.dispatcher().dispatch("add", &[])?;
//! assert_eq!(root.inner_html(), "<output>42</output>");
//! # Ok(())
//! # }
//! # #[cfg(target_arch = "wasm32")]
//! # fn main() {}
//! ```

use crate::arena::NodeId;
use crate::builder::Component;
use crate::dom;
use crate::error::{VdomError, VdomResult};
use crate::vdom::{Vdom, VdomWeak};
use crate::vnode::{Props, VNode, Value};
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Update<M> = Rc<dyn Fn(&M, &[Value]) -> M>;

/// The named update functions of an `elm` program.
pub struct Updates<M> {
    table: FxHashMap<String, Update<M>>,
}

impl<M> Default for Updates<M> {
    fn default() -> Updates<M> {
        Updates {
            table: FxHashMap::default(),
        }
    }
}

impl<M> Updates<M> {
    pub fn new() -> Updates<M> {
        Updates::default()
    }

    /// Register the update function for `action`. It receives the current
    /// model and the dispatched arguments, and returns the next model.
    pub fn on<F>(mut self, action: &str, update: F) -> Updates<M>
    where
        F: 'static + Fn(&M, &[Value]) -> M,
    {
        self.table.insert(action.to_string(), Rc::new(update));
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<M> fmt::Debug for Updates<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut actions: Vec<_> = self.table.keys().collect();
        actions.sort();
        f.debug_tuple("Updates").field(&actions).finish()
    }
}

/// A running `elm` program.
pub struct Elm<M> {
    inner: Rc<ElmInner<M>>,
}

struct ElmInner<M> {
    model: RefCell<M>,
    updates: Updates<M>,
    view: Box<dyn Fn(&M, &Dispatcher<M>) -> VNode>,
    root: RefCell<Option<(VdomWeak, NodeId)>>,
}

/// Sends actions to an `elm` program. Cheap to clone into event handlers.
pub struct Dispatcher<M> {
    inner: Weak<ElmInner<M>>,
}

impl<M> Clone for Dispatcher<M> {
    fn clone(&self) -> Dispatcher<M> {
        Dispatcher {
            inner: self.inner.clone(),
        }
    }
}

impl<M> fmt::Debug for Dispatcher<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Dispatcher").finish()
    }
}

impl<M: fmt::Debug> fmt::Debug for Elm<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Elm")
            .field("model", &self.inner.model)
            .field("updates", &self.inner.updates)
            .field("root", &self.inner.root.borrow().as_ref().map(|(_, id)| *id))
            .finish()
    }
}

/// Create an `elm` program from an initial model, its update table and a
/// view of the model.
pub fn elm<M, V>(model: M, updates: Updates<M>, view: V) -> Elm<M>
where
    M: 'static,
    V: 'static + Fn(&M, &Dispatcher<M>) -> VNode,
{
    Elm {
        inner: Rc::new(ElmInner {
            model: RefCell::new(model),
            updates,
            view: Box::new(view),
            root: RefCell::new(None),
        }),
    }
}

impl<M: 'static> Elm<M> {
    /// Render the program's view into `root`.
    pub fn mount(&self, vdom: &Vdom, root: &dom::Node) -> VdomResult<NodeId> {
        let id = vdom.mount(root_component(&self.inner), (), root)?;
        *self.inner.root.borrow_mut() = Some((vdom.weak(), id));
        Ok(id)
    }

    pub fn dispatcher(&self) -> Dispatcher<M> {
        Dispatcher {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn model(&self) -> M
    where
        M: Clone,
    {
        self.inner.model.borrow().clone()
    }

    /// The root node, once mounted.
    pub fn root(&self) -> Option<NodeId> {
        self.inner.root.borrow().as_ref().map(|(_, id)| *id)
    }
}

fn root_component<M: 'static>(inner: &Rc<ElmInner<M>>) -> Component {
    let inner = inner.clone();
    Component::new(move |_: &Props| {
        let dispatcher = Dispatcher {
            inner: Rc::downgrade(&inner),
        };
        (inner.view)(&inner.model.borrow(), &dispatcher)
    })
}

impl<M: 'static> Dispatcher<M> {
    /// Run the update function registered for `action` and re-render the
    /// program's root with the resulting model.
    ///
    /// Before the program is mounted this only updates the model.
    pub fn dispatch(&self, action: &str, args: &[Value]) -> VdomResult<()> {
        let inner = self.inner.upgrade().ok_or(VdomError::Dropped)?;
        let update = inner
            .updates
            .table
            .get(action)
            .cloned()
            .ok_or_else(|| VdomError::UnknownAction(action.to_string()))?;

        let next = update(&inner.model.borrow(), args);
        *inner.model.borrow_mut() = next;
        debug!("Dispatcher::dispatch: {:?}", action);

        let root = inner.root.borrow().clone();
        match root {
            Some((vdom, id)) => vdom.updater(&root_component(&inner), id).update(()).map(|_| ()),
            None => Ok(()),
        }
    }
}
