//! Depth-first walk that attaches successor names to every item.
//!
//! The runtime menu is a singly linked structure: each item points at its next
//! sibling, and each sub menu also points at its first child. Links are name
//! lookups on the item tree, so they do not depend on emission order.

use crate::generator::naming::MenuNaming;
use crate::menu::{item::ROOT_ID, tree::MenuTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Next sibling, `None` for the last item at its level.
    pub next: Option<String>,
    /// Only set for sub menus; the inner `None` marks an empty sub menu.
    pub first_child: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearEntry {
    pub item_id: u16,
    pub link: LinkRecord,
}

/// Pre-order sequence: a sub menu comes before all of its descendants.
pub fn linearize(tree: &MenuTree, naming: &MenuNaming) -> Vec<LinearEntry> {
    let mut out = Vec::with_capacity(tree.len());
    walk(tree, naming, ROOT_ID, &mut out);
    out
}

fn walk(tree: &MenuTree, naming: &MenuNaming, parent: u16, out: &mut Vec<LinearEntry>) {
    let siblings = tree.children(parent);
    for (i, &id) in siblings.iter().enumerate() {
        let Some(item) = tree.get(id) else { continue };
        let next = siblings.get(i + 1).map(|&n| naming.resolve(n));

        if item.is_container() {
            let first_child = tree.children(id).first().map(|&c| naming.resolve(c));
            out.push(LinearEntry {
                item_id: id,
                link: LinkRecord { next, first_child: Some(first_child) },
            });
            walk(tree, naming, id, out);
        } else {
            out.push(LinearEntry {
                item_id: id,
                link: LinkRecord { next, first_child: None },
            });
        }
    }
}
