//! Turns display names into C++ identifiers.
//!
//! `"Wifi settings"` becomes `WifiSettings`; with recursive naming enabled a
//! child of that sub menu named `"ssid"` becomes `WifiSettingsSsid`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::generator::format::NULL_NAME;
use crate::menu::{item::ROOT_ID, tree::MenuTree};

static WORD_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{P}\p{Z}\t\r\n\x0B\x0C^]+").expect("valid split pattern"));

pub struct MenuNaming<'a> {
    tree: &'a MenuTree,
    recursive: bool,
}

impl<'a> MenuNaming<'a> {
    pub fn new(tree: &'a MenuTree, recursive: bool) -> Self {
        Self { tree, recursive }
    }

    /// Identifier fragment for `id`; `NULL` for the root or an unknown id.
    pub fn resolve(&self, id: u16) -> String {
        let Some(item) = self.tree.get(id) else {
            return NULL_NAME.to_string();
        };

        let parent = self.tree.find_parent(id).unwrap_or(ROOT_ID);
        if !self.recursive || parent == ROOT_ID {
            return name_to_identifier(&item.name);
        }

        // collect up to the root, then join root first
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur.filter(|&c| c != ROOT_ID) {
            if let Some(i) = self.tree.get(c) {
                parts.push(name_to_identifier(&i.name));
            }
            cur = self.tree.find_parent(c);
        }
        parts.reverse();
        parts.concat()
    }

    /// `menu<Name>`, the runtime object for an item.
    pub fn variable_name(&self, id: u16) -> String {
        format!("menu{}", self.resolve(id))
    }

    /// `fn<Name>RtCall`, the render function of a runtime-backed item.
    pub fn rt_function_name(&self, id: u16) -> String {
        format!("fn{}RtCall", self.resolve(id))
    }

    /// `&menu<Name>`, or `NULL` when there is no item.
    pub fn reference(&self, name: Option<&str>) -> String {
        match name {
            Some(n) => format!("&menu{n}"),
            None => NULL_NAME.to_string(),
        }
    }

    /// Variable of the first top-level item; plugins use it as the menu root.
    pub fn root_variable(&self) -> String {
        self.tree
            .children(ROOT_ID)
            .first()
            .map(|&id| self.variable_name(id))
            .unwrap_or_default()
    }
}

/// Split on punctuation, separators and control characters, capitalise the
/// first letter of each word and join without a separator.
pub fn name_to_identifier(name: &str) -> String {
    WORD_SPLIT.split(name).map(capitalise_first).collect()
}

fn capitalise_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
