//! Menu tree arena.
//!
//! Items are stored once, keyed by id. The ordered child lists and the parent
//! index are kept beside them, so `find_parent` is a table lookup rather than a
//! back pointer on the item. The root (`ROOT_ID`) has no item of its own.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::menu::item::{MenuItem, ROOT_ID};

#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    items: IndexMap<u16, MenuItem>,
    children: HashMap<u16, Vec<u16>>,
    parents: HashMap<u16, u16>,
}

impl MenuTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` as the last child of `parent`.
    ///
    /// The parent must be the root or an existing sub menu, and ids are unique,
    /// which keeps the tree acyclic with exactly one parent per item.
    pub fn add(&mut self, parent: u16, item: MenuItem) -> Result<(), String> {
        if item.id == ROOT_ID {
            return Err(format!("item '{}' uses the reserved root id", item.name));
        }
        if self.items.contains_key(&item.id) {
            return Err(format!("duplicate item id {} ('{}')", item.id, item.name));
        }
        if parent != ROOT_ID {
            match self.items.get(&parent) {
                Some(p) if p.is_container() => {}
                Some(p) => {
                    return Err(format!(
                        "parent {} ('{}') of '{}' is not a sub menu",
                        parent, p.name, item.name
                    ));
                }
                None => {
                    return Err(format!("unknown parent {} for '{}'", parent, item.name));
                }
            }
        }

        let id = item.id;
        self.children.entry(parent).or_default().push(id);
        self.parents.insert(id, parent);
        if item.is_container() {
            self.children.entry(id).or_default();
        }
        self.items.insert(id, item);
        Ok(())
    }

    pub fn get(&self, id: u16) -> Option<&MenuItem> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ordered children of `id`; empty for leaves and unknown ids.
    pub fn children(&self, id: u16) -> &[u16] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items directly under `id`, in order.
    pub fn child_items(&self, id: u16) -> impl Iterator<Item = &MenuItem> + '_ {
        self.children(id).iter().filter_map(|c| self.items.get(c))
    }

    /// Parent of `id`. The root and unknown ids have none.
    pub fn find_parent(&self, id: u16) -> Option<u16> {
        self.parents.get(&id).copied()
    }

    /// Every item except the root, in depth-first pre-order.
    pub fn all_items(&self) -> Vec<&MenuItem> {
        let mut out = Vec::with_capacity(self.items.len());
        self.walk(ROOT_ID, &mut out);
        out
    }

    /// The root followed by every sub menu in pre-order.
    pub fn all_sub_menus(&self) -> Vec<u16> {
        let mut out = vec![ROOT_ID];
        out.extend(
            self.all_items()
                .into_iter()
                .filter(|i| i.is_container())
                .map(|i| i.id),
        );
        out
    }

    fn walk<'a>(&'a self, parent: u16, out: &mut Vec<&'a MenuItem>) {
        for item in self.child_items(parent) {
            out.push(item);
            if item.is_container() {
                self.walk(item.id, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::item::ItemKind;

    fn sub(id: u16, name: &str) -> MenuItem {
        MenuItem::new(id, name, ItemKind::SubMenu { secured: false })
    }

    fn action(id: u16, name: &str) -> MenuItem {
        MenuItem::new(id, name, ItemKind::Action)
    }

    #[test]
    fn parent_index_and_pre_order() {
        let mut tree = MenuTree::new();
        tree.add(ROOT_ID, sub(1, "Settings")).unwrap();
        tree.add(1, action(2, "Reset")).unwrap();
        tree.add(ROOT_ID, action(3, "Status")).unwrap();

        assert_eq!(tree.find_parent(2), Some(1));
        assert_eq!(tree.find_parent(3), Some(ROOT_ID));
        assert_eq!(tree.find_parent(ROOT_ID), None);

        let order: Vec<u16> = tree.all_items().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(tree.all_sub_menus(), vec![ROOT_ID, 1]);
    }

    #[test]
    fn rejects_bad_structure() {
        let mut tree = MenuTree::new();
        tree.add(ROOT_ID, action(1, "A")).unwrap();
        assert!(tree.add(ROOT_ID, action(1, "Again")).is_err());
        assert!(tree.add(1, action(2, "Under leaf")).is_err());
        assert!(tree.add(9, action(3, "Orphan")).is_err());
        assert!(tree.add(ROOT_ID, action(ROOT_ID, "Root")).is_err());
    }

    #[test]
    fn empty_sub_menu_has_no_children() {
        let mut tree = MenuTree::new();
        tree.add(ROOT_ID, sub(1, "Empty")).unwrap();
        assert!(tree.children(1).is_empty());
        assert_eq!(tree.child_items(ROOT_ID).count(), 1);
    }
}
