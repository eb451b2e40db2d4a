//! Errors reported by the virtual DOM's entry points.

use crate::arena::NodeId;
use thiserror::Error;

/// Errors that can occur while mounting, updating or dispatching.
///
/// Bugs in the calling code (such as asking the reconciler to diff two absent
/// nodes) are not reported through this type: they panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VdomError {
    /// The virtual DOM backing a weak handle was dropped.
    #[error("The virtual DOM was dropped.")]
    Dropped,

    /// The node was removed from the tree, so its id no longer resolves.
    #[error("node {0:?} is no longer part of the tree")]
    StaleNode(NodeId),

    /// The node's host node is not attached to a parent, so there is nowhere
    /// to render it.
    #[error("node {0:?} has no parent host node")]
    Detached(NodeId),

    /// An update was requested while the virtual DOM was in the middle of
    /// rendering, e.g. from a synchronous `on_update` hook.
    #[error("the virtual DOM is already rendering")]
    Busy,

    /// An `elm` program received an action that has no update function.
    #[error("no update function registered for action {0:?}")]
    UnknownAction(String),
}

/// Result type alias for virtual DOM operations.
pub type VdomResult<T> = Result<T, VdomError>;
