//! Storage for live nodes.
//!
//! Every node that has been rendered into the host DOM lives in the `Arena` of
//! the `Vdom` that rendered it, and is addressed by a `NodeId`. Parents refer
//! to their children by id, so re-rendering a subtree in place (see
//! `Updater::update`) is observed by every holder of that subtree's id without
//! any notification.
//!
//! Ids are generational: once a slot is freed, ids that pointed at its
//! previous occupant stop resolving instead of silently aliasing whatever is
//! stored there next.

use crate::dom;
use crate::hooks::Hooks;
use crate::vnode::{Kind, NodeRef, Props};
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Index, IndexMut};

/// The stable identity of a position in a rendered tree.
///
/// A position keeps its id when it is patched in place and when its node is
/// replaced by a node of a different kind. The id is released when the
/// position is removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

/// A node that currently backs a host node.
pub(crate) struct LiveNode {
    pub(crate) kind: Kind,
    pub(crate) props: Props,
    pub(crate) children: Vec<NodeId>,
    /// `1` right after insertion, incremented on every in-place patch.
    pub(crate) life_cycle: u32,
    pub(crate) dom: dom::Node,
    pub(crate) hooks: Hooks,
    pub(crate) refs: SmallVec<[NodeRef; 1]>,
}

impl fmt::Debug for LiveNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LiveNode")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .field("children", &self.children)
            .field("life_cycle", &self.life_cycle)
            .finish()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<LiveNode>,
}

#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Arena {
    pub(crate) fn insert(&mut self, node: LiveNode) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.node.is_none());
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Free the slot behind `id`, returning its node.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<LiveNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(node)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&LiveNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut LiveNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    #[inline]
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// How many live nodes are stored.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Index<NodeId> for Arena {
    type Output = LiveNode;

    fn index(&self, id: NodeId) -> &LiveNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("Arena: {:?} does not refer to a live node", id),
        }
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut LiveNode {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("Arena: {:?} does not refer to a live node", id),
        }
    }
}
