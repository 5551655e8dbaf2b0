//! Caret preservation across render-tree rebuilds.
//!
//! The caret's logical position is a plain char offset into the
//! plain-text projection of the document. Before an operation replaces
//! the rendered markup (applying or removing highlights), the caller
//! captures that offset; after the new tree exists, it restores the
//! caret to the equivalent position. User keystrokes are never
//! bracketed this way — they mutate text in place without a full
//! rebuild.

use crate::render::RenderTree;

/// A caret position expressed against a concrete render tree: the node
/// index and the char offset within that node's text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretLocus {
    pub node: usize,
    pub offset: usize,
}

/// Computes the caret's char offset into the plain-text projection.
///
/// Counts the text content of every node before `locus.node`, plus the
/// intra-node offset. Out-of-range loci clamp to the nearest valid
/// position rather than failing.
pub fn capture_offset(tree: &RenderTree, locus: CaretLocus) -> usize {
    let mut total = 0;
    for (idx, node) in tree.nodes.iter().enumerate() {
        let len = node.len_chars();
        if idx == locus.node {
            return total + locus.offset.min(len);
        }
        total += len;
    }
    total
}

/// Places the caret at the node containing the given projection offset.
///
/// Walks nodes in order, accumulating text lengths, and stops at the
/// first node where the running total reaches `offset`. If the tree
/// holds fewer chars than `offset` (the text shrank), the caret lands at
/// the last valid end position. An empty tree has nowhere to place a
/// caret and yields `None`; callers treat that as a no-op.
pub fn restore_offset(tree: &RenderTree, offset: usize) -> Option<CaretLocus> {
    let mut remaining = offset;
    let mut last = None;
    for (idx, node) in tree.nodes.iter().enumerate() {
        let len = node.len_chars();
        if remaining <= len {
            return Some(CaretLocus {
                node: idx,
                offset: remaining,
            });
        }
        remaining -= len;
        last = Some(CaretLocus { node: idx, offset: len });
    }
    last
}
