//! Best-effort hydration: adopting markup that is already under the mount
//! root instead of creating it again.
//!
//! The walk is purely structural. Host nodes are claimed pairwise against the
//! virtual tree, skipping (and removing) whitespace-only text nodes. A claimed
//! node is recorded as never rendered (`life_cycle` 0) with the new props as
//! its attribute baseline, so the render that follows fires `on_mount`,
//! attaches listeners and fixes up text, and leaves matching elements alone.

use crate::arena::{Arena, LiveNode, NodeId};
use crate::dom;
use crate::hooks::Hooks;
use crate::vnode::{Kind, Props, VNode};
use smallvec::SmallVec;

/// Claim the first non-blank child of `root` for `vnode`. Returns `None` when
/// `root` has no such child, in which case there is nothing to hydrate.
pub(crate) fn hydrate(arena: &mut Arena, vnode: &VNode, root: &dom::Node) -> Option<NodeId> {
    let first = non_blank_children(root).into_iter().next()?;
    debug!("hydrate: adopting existing markup under the mount root");
    Some(claim(arena, vnode, first))
}

fn is_blank(node: &dom::Node) -> bool {
    dom::is_text_node(node) && dom::text_content(node).trim().is_empty()
}

/// The children of `parent`, with whitespace-only text nodes removed from
/// the host tree along the way.
fn non_blank_children(parent: &dom::Node) -> Vec<dom::Node> {
    let mut children = dom::child_nodes(parent);
    children.retain(|child| {
        if is_blank(child) {
            dom::discard_child(parent, child);
            false
        } else {
            true
        }
    });
    children
}

fn claim(arena: &mut Arena, vnode: &VNode, node: dom::Node) -> NodeId {
    let kind = match dom::tag_name(&node) {
        Some(tag) if !dom::is_text_node(&node) => Kind::element(&tag),
        _ => Kind::Text,
    };

    let (props, children) = if kind != vnode.kind {
        warn!(
            "hydrate: expected {:?} but found {:?}; it will be replaced",
            vnode.kind, kind
        );
        (Props::new(), vec![])
    } else if kind.is_text() {
        (Props::new().attr("value", dom::text_content(&node)), vec![])
    } else {
        let children = vnode
            .children
            .iter()
            .zip(non_blank_children(&node))
            .map(|(child, host)| claim(arena, child, host))
            .collect();
        (vnode.props.attributes_only(), children)
    };

    arena.insert(LiveNode {
        kind,
        props,
        children,
        life_cycle: 0,
        dom: node,
        hooks: Hooks::default(),
        refs: SmallVec::new(),
    })
}
