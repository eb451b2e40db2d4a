//! The `twig` virtual DOM.
//!
//! Trees are built with the hyperscript builder `h`, mounted into a host DOM
//! node through a `Vdom`, and re-rendered in place through an `Updater`.
//! Rendering mutates the DOM synchronously; `on_mount`/`on_unmount` hooks and
//! listener changes are deferred until the `Vdom` is flushed, which happens
//! on the next macrotask in the browser and is up to the caller elsewhere.
//!
//! ## Example
//!
//! ```
//! use twig::dom::Node;
//! use twig::{h, Component, Props, Vdom};
//!
//! # #[cfg(not(target_arch = "wasm32"))]
//! # fn main() -> Result<(), twig::VdomError> {
//! let hello = Component::new(|props: &Props| {
//!     h(
//!         "p",
//!         Props::new().attr("id", props.get("id").cloned().unwrap_or(0.into())),
//!         props.get("greeting").map(|g| g.to_string()),
//!     )
//! });
//!
//! let container = Node::element("div");
//! let vdom = Vdom::new();
//! let root = vdom.mount(
//!     &hello,
//!     Props::new().attr("id", 123).attr("greeting", "hello world"),
//!     &container,
//! )?;
//! assert_eq!(container.inner_html(), r#"<p id="123">hello world</p>"#);
//!
//! vdom.updater(&hello, root)
//!     .update(Props::new().attr("id", 567).attr("greeting", "bonjour monde"))?;
//! assert_eq!(container.inner_html(), r#"<p id="567">bonjour monde</p>"#);
//! # Ok(())
//! # }
//! # #[cfg(target_arch = "wasm32")]
//! # fn main() {}
//! ```

#[macro_use]
extern crate log;

pub mod dom;

mod arena;
mod builder;
mod diff;
mod elm;
mod error;
mod hooks;
mod hydrate;
mod state;
mod store;
mod traversal;
mod vdom;
mod vnode;

// Re-export items at the top level.
pub use self::arena::NodeId;
pub use self::builder::{h, Child, Component, IntoChildren, Rendered, Tag};
pub use self::elm::{elm, Dispatcher, Elm, Updates};
pub use self::error::{VdomError, VdomResult};
pub use self::hooks::{on_mount, on_unmount, on_update, Hook, Hooks, Lifecycle};
pub use self::state::{with_idempotent_state, with_state, State};
pub use self::store::{connect, connect_with, Store, Subscription};
pub use self::traversal::Traverse;
pub use self::vdom::{Mountable, Updater, Vdom, VdomWeak};
pub use self::vnode::{Handler, Kind, NodeRef, Props, VNode, Value};
