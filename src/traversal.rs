//! Depth-first, preorder walks over virtual and live trees.
//!
//! Walks are lazy and finite. A walker is consumed as it goes; walking the
//! same root again means asking for a fresh walker.

use crate::arena::{Arena, LiveNode, NodeId};
use crate::vnode::VNode;

/// Preorder iterator over a `VNode` and all of its descendants.
#[derive(Debug)]
pub struct Traverse<'a> {
    stack: Vec<&'a VNode>,
}

impl<'a> Traverse<'a> {
    pub(crate) fn new(root: &'a VNode) -> Traverse<'a> {
        Traverse { stack: vec![root] }
    }
}

impl<'a> Iterator for Traverse<'a> {
    type Item = &'a VNode;

    fn next(&mut self) -> Option<&'a VNode> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Preorder iterator over subtrees stored in an `Arena`.
///
/// Used to visit a discarded subtree once before its slots are freed.
pub(crate) struct LiveTraverse<'a> {
    arena: &'a Arena,
    stack: Vec<NodeId>,
}

impl<'a> LiveTraverse<'a> {
    /// Walk the subtrees rooted at each of `roots`, in order.
    pub(crate) fn new(arena: &'a Arena, roots: &[NodeId]) -> LiveTraverse<'a> {
        LiveTraverse {
            arena,
            stack: roots.iter().rev().copied().collect(),
        }
    }
}

impl<'a> Iterator for LiveTraverse<'a> {
    type Item = (NodeId, &'a LiveNode);

    fn next(&mut self) -> Option<(NodeId, &'a LiveNode)> {
        loop {
            let id = self.stack.pop()?;
            match self.arena.get(id) {
                Some(node) => {
                    self.stack.extend(node.children.iter().rev().copied());
                    return Some((id, node));
                }
                None => warn!("LiveTraverse: skipping stale {:?}", id),
            }
        }
    }
}
