//! Items that need user code or generated render scaffolding.

use std::collections::BTreeMap;

use crate::generator::{format::NO_CALLBACK, naming::MenuNaming};
use crate::menu::{
    item::{ItemKind, MenuItem},
    tree::MenuTree,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRequirement {
    pub item_id: u16,
    /// Function declared by the user on the item, if any.
    pub callback_name: Option<String>,
    /// Symbol the generated code refers to.
    pub symbol: String,
    /// Declaration for the header; empty when nothing needs declaring.
    pub header: String,
    /// Source lines emitted just before the item's records.
    pub source: Vec<String>,
}

impl CallbackRequirement {
    pub fn new(item: &MenuItem, naming: &MenuNaming) -> Self {
        let callback_name = item.callback().map(str::to_string);
        let symbol = callback_symbol(item, naming);
        let render_decl = format!(
            "int {symbol}(RuntimeMenuItem* item, uint8_t row, RenderFnMode mode, char* buffer, int bufferSize);"
        );

        let header = match (&item.kind, &callback_name) {
            (ItemKind::RuntimeList { .. }, _) => render_decl,
            (_, Some(cb)) => format!("void CALLBACK_FUNCTION {cb}(int id);"),
            (_, None) => String::new(),
        };

        let source = match &item.kind {
            ItemKind::Text { .. } => vec![render_macro(item, naming, "textItemRenderFn")],
            ItemKind::IpAddress => vec![render_macro(item, naming, "ipAddressRenderFn")],
            _ => Vec::new(),
        };

        Self { item_id: item.id, callback_name, symbol, header, source }
    }

    /// Whether the user has to write a function for this item.
    pub fn needs_user_function(&self) -> bool {
        !self.header.is_empty()
    }
}

/// User callback when declared; otherwise the generated render function name.
pub fn callback_symbol(item: &MenuItem, naming: &MenuNaming) -> String {
    match item.callback() {
        Some(cb) => cb.to_string(),
        None => naming.rt_function_name(item.id),
    }
}

fn render_macro(item: &MenuItem, naming: &MenuNaming, render_fn: &str) -> String {
    format!(
        "RENDERING_CALLBACK_NAME_INVOKE({}, {}, \"{}\", {}, {})",
        naming.rt_function_name(item.id),
        render_fn,
        item.name.replace('\\', "\\\\").replace('"', "\\\""),
        item.eeprom_address,
        item.callback().unwrap_or(NO_CALLBACK)
    )
}

/// Requirements for every child of every container (the root counts as the
/// top-level container, but is never collected itself). Keyed by item id, so
/// an item reached twice yields one entry.
pub fn collect(tree: &MenuTree, naming: &MenuNaming) -> BTreeMap<u16, CallbackRequirement> {
    tree.all_sub_menus()
        .into_iter()
        .flat_map(|sub| tree.child_items(sub))
        .filter(|item| item.callback().is_some() || item.needs_runtime_structure())
        .map(|item| (item.id, CallbackRequirement::new(item, naming)))
        .collect()
}

/// Emission order: entries without a callback name first (in map order),
/// then named entries ascending.
pub fn sorted(map: &BTreeMap<u16, CallbackRequirement>) -> Vec<&CallbackRequirement> {
    let mut out: Vec<&CallbackRequirement> = map.values().collect();
    out.sort_by(|a, b| match (&a.callback_name, &b.callback_name) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::item::ROOT_ID;

    fn tree() -> MenuTree {
        let mut t = MenuTree::new();
        t.add(ROOT_ID, MenuItem::new(1, "Settings", ItemKind::SubMenu { secured: false }))
            .unwrap();
        t.add(
            1,
            MenuItem::new(
                2,
                "Brightness",
                ItemKind::Analog { max_value: 10, offset: 0, divisor: 1, unit_name: String::new() },
            ),
        )
        .unwrap();
        t.add(1, MenuItem::new(3, "Ssid", ItemKind::Text { text_length: 12 }).with_eeprom(20))
            .unwrap();
        t.add(1, MenuItem::new(4, "Files", ItemKind::RuntimeList { initial_rows: 3 }))
            .unwrap();
        t.add(ROOT_ID, MenuItem::new(5, "Status", ItemKind::Action).with_function("onStatus"))
            .unwrap();
        t.add(ROOT_ID, MenuItem::new(6, "Apply", ItemKind::Action).with_function("applyAll"))
            .unwrap();
        t
    }

    #[test]
    fn only_callbacks_and_runtime_items_collected() {
        let t = tree();
        let naming = MenuNaming::new(&t, false);
        let map = collect(&t, &naming);
        let ids: Vec<u16> = map.keys().copied().collect();
        assert_eq!(ids, vec![3, 4, 5, 6]);
    }

    #[test]
    fn declared_names_used_verbatim() {
        let t = tree();
        let naming = MenuNaming::new(&t, false);
        let map = collect(&t, &naming);
        let status = &map[&5];
        assert_eq!(status.symbol, "onStatus");
        assert_eq!(status.header, "void CALLBACK_FUNCTION onStatus(int id);");
        assert!(status.source.is_empty());
    }

    #[test]
    fn runtime_items_get_generated_names() {
        let t = tree();
        let naming = MenuNaming::new(&t, false);
        let map = collect(&t, &naming);

        let text = &map[&3];
        assert_eq!(text.symbol, "fnSsidRtCall");
        assert!(text.header.is_empty());
        assert_eq!(
            text.source,
            vec!["RENDERING_CALLBACK_NAME_INVOKE(fnSsidRtCall, textItemRenderFn, \"Ssid\", 20, NO_CALLBACK)"]
        );

        let list = &map[&4];
        assert_eq!(list.symbol, "fnFilesRtCall");
        assert!(list.header.starts_with("int fnFilesRtCall(RuntimeMenuItem* item"));
        assert!(list.source.is_empty());
    }

    #[test]
    fn unnamed_entries_sort_first_then_lexical() {
        let t = tree();
        let naming = MenuNaming::new(&t, false);
        let map = collect(&t, &naming);
        let order: Vec<u16> = sorted(&map).iter().map(|c| c.item_id).collect();
        assert_eq!(order, vec![3, 4, 6, 5]);
    }
}
