//! Structural records: one emitted C++ definition each.
//!
//! Every menu item turns into a small group of records (its constant info
//! block, its runtime object, and for some kinds a string table or render
//! macro). A single exhaustive `match` over [`ItemKind`] decides the group.

use uuid::Uuid;

use crate::generator::{
    callbacks::callback_symbol,
    format::NO_CALLBACK,
    linearize::{LinkRecord, linearize},
    naming::MenuNaming,
};
use crate::menu::{
    item::{ItemKind, MenuItem, ROOT_ID},
    tree::MenuTree,
};
use crate::plugins::creator::HeaderDefinition;

const RUNTIME_ITEM_HEADER: &str = "RuntimeMenuItem.h";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Quoted(String),
    Raw(String),
}

/// How a record is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructShape {
    /// `const Type name = { ... };`
    Info,
    /// `Type name(...);`
    Object,
    /// `TYPE(...)`, a runtime macro that defines its own symbol.
    Macro,
    /// A table of strings named `name`, one entry per element.
    StringChoices,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralRecord {
    pub item_id: u16,
    pub struct_type: String,
    pub struct_name: String,
    pub shape: StructShape,
    pub elements: Vec<Element>,
    pub prog_mem: bool,
    pub requires_extern: bool,
    pub header_requirements: Vec<HeaderDefinition>,
}

impl StructuralRecord {
    pub fn new(item_id: u16, shape: StructShape, struct_type: &str, struct_name: &str) -> Self {
        Self {
            item_id,
            struct_type: struct_type.to_string(),
            struct_name: struct_name.to_string(),
            shape,
            elements: Vec::new(),
            prog_mem: false,
            requires_extern: false,
            header_requirements: Vec::new(),
        }
    }

    pub fn quoted(mut self, value: impl Into<String>) -> Self {
        self.elements.push(Element::Quoted(value.into()));
        self
    }

    pub fn raw(mut self, value: impl ToString) -> Self {
        self.elements.push(Element::Raw(value.to_string()));
        self
    }

    pub fn prog_mem(mut self) -> Self {
        self.prog_mem = true;
        self
    }

    pub fn requires_extern(mut self) -> Self {
        self.requires_extern = true;
        self
    }

    pub fn needs_header(mut self, name: &str) -> Self {
        self.header_requirements.push(HeaderDefinition::global(name));
        self
    }

    /// Application identity: always in read-only memory and always exported.
    pub fn application(name: &str, uuid: &Uuid) -> Self {
        StructuralRecord::new(ROOT_ID, StructShape::Info, "ConnectorLocalInfo", "applicationInfo")
            .quoted(name)
            .quoted(uuid.to_string())
            .prog_mem()
            .requires_extern()
    }
}

fn eeprom_field(address: i32) -> String {
    if address < 0 { "0xffff".to_string() } else { address.to_string() }
}

/// Records for one item, in the order they must appear in the source.
pub fn build(item: &MenuItem, link: &LinkRecord, naming: &MenuNaming) -> Vec<StructuralRecord> {
    let id = item.id;
    let name = naming.resolve(id);
    let info = format!("minfo{name}");
    let var = format!("menu{name}");
    let info_ref = format!("&{info}");
    let next = naming.reference(link.next.as_deref());
    let callback = item.callback().unwrap_or(NO_CALLBACK);
    let eeprom = eeprom_field(item.eeprom_address);

    match &item.kind {
        ItemKind::Analog { max_value, offset, divisor, unit_name } => vec![
            StructuralRecord::new(id, StructShape::Info, "AnalogMenuInfo", &info)
                .quoted(&item.name)
                .raw(id)
                .raw(&eeprom)
                .raw(max_value)
                .raw(callback)
                .raw(offset)
                .raw(divisor)
                .quoted(unit_name)
                .prog_mem(),
            StructuralRecord::new(id, StructShape::Object, "AnalogMenuItem", &var)
                .raw(&info_ref)
                .raw(0)
                .raw(&next)
                .requires_extern(),
        ],
        ItemKind::Enum { choices } => {
            let table = format!("enumStr{name}");
            let mut strings = StructuralRecord::new(id, StructShape::StringChoices, "char", &table)
                .prog_mem();
            for c in choices {
                strings = strings.quoted(c);
            }
            vec![
                strings,
                StructuralRecord::new(id, StructShape::Info, "EnumMenuInfo", &info)
                    .quoted(&item.name)
                    .raw(id)
                    .raw(&eeprom)
                    .raw(choices.len().saturating_sub(1))
                    .raw(callback)
                    .raw(&table)
                    .prog_mem(),
                StructuralRecord::new(id, StructShape::Object, "EnumMenuItem", &var)
                    .raw(&info_ref)
                    .raw(0)
                    .raw(&next)
                    .requires_extern(),
            ]
        }
        ItemKind::Boolean { naming: labels } => vec![
            StructuralRecord::new(id, StructShape::Info, "BooleanMenuInfo", &info)
                .quoted(&item.name)
                .raw(id)
                .raw(&eeprom)
                .raw(1)
                .raw(callback)
                .raw(labels.runtime_constant())
                .prog_mem(),
            StructuralRecord::new(id, StructShape::Object, "BooleanMenuItem", &var)
                .raw(&info_ref)
                .raw(false)
                .raw(&next)
                .requires_extern(),
        ],
        ItemKind::Float { decimal_places } => vec![
            StructuralRecord::new(id, StructShape::Info, "FloatMenuInfo", &info)
                .quoted(&item.name)
                .raw(id)
                .raw(&eeprom)
                .raw(decimal_places)
                .raw(callback)
                .prog_mem(),
            StructuralRecord::new(id, StructShape::Object, "FloatMenuItem", &var)
                .raw(&info_ref)
                .raw(&next)
                .requires_extern(),
        ],
        ItemKind::Action => vec![
            StructuralRecord::new(id, StructShape::Info, "AnyMenuInfo", &info)
                .quoted(&item.name)
                .raw(id)
                .raw("0xffff")
                .raw(0)
                .raw(callback)
                .prog_mem(),
            StructuralRecord::new(id, StructShape::Object, "ActionMenuItem", &var)
                .raw(&info_ref)
                .raw(&next)
                .requires_extern(),
        ],
        ItemKind::Text { text_length } => vec![
            StructuralRecord::new(id, StructShape::Object, "TextMenuItem", &var)
                .raw(naming.rt_function_name(id))
                .raw(id)
                .raw(text_length)
                .raw(&next)
                .requires_extern()
                .needs_header(RUNTIME_ITEM_HEADER),
        ],
        ItemKind::IpAddress => vec![
            StructuralRecord::new(id, StructShape::Object, "IpAddressMenuItem", &var)
                .raw(naming.rt_function_name(id))
                .raw(id)
                .raw(&next)
                .requires_extern()
                .needs_header(RUNTIME_ITEM_HEADER),
        ],
        ItemKind::RuntimeList { initial_rows } => vec![
            StructuralRecord::new(id, StructShape::Object, "ListRuntimeMenuItem", &var)
                .raw(id)
                .raw(initial_rows)
                .raw(callback_symbol(item, naming))
                .raw(&next)
                .requires_extern()
                .needs_header(RUNTIME_ITEM_HEADER),
        ],
        ItemKind::SubMenu { .. } => {
            let rt_fn = naming.rt_function_name(id);
            let back = format!("menuBack{name}");
            let first_child = link.first_child.clone().flatten();
            vec![
                StructuralRecord::new(id, StructShape::Info, "SubMenuInfo", &info)
                    .quoted(&item.name)
                    .raw(id)
                    .raw("0xffff")
                    .raw(0)
                    .raw(callback)
                    .prog_mem(),
                StructuralRecord::new(id, StructShape::Macro, "RENDERING_CALLBACK_NAME_INVOKE", &rt_fn)
                    .raw(&rt_fn)
                    .raw("backSubItemRenderFn")
                    .quoted(&item.name)
                    .raw(-1)
                    .raw(NO_CALLBACK)
                    .needs_header(RUNTIME_ITEM_HEADER),
                StructuralRecord::new(id, StructShape::Object, "BackMenuItem", &back)
                    .raw(&rt_fn)
                    .raw(naming.reference(first_child.as_deref()))
                    .requires_extern(),
                StructuralRecord::new(id, StructShape::Object, "SubMenuItem", &var)
                    .raw(&info_ref)
                    .raw(format!("&{back}"))
                    .raw(&next)
                    .requires_extern(),
            ]
        }
    }
}

/// All records in final emission order.
///
/// Groups are built in pre-order, the application record is appended, and the
/// whole sequence of groups is reversed. Siblings and children always come
/// later in pre-order, so after reversal every record is defined after the
/// records it points at, and the application record comes first.
pub fn generate_menus_in_order(
    tree: &MenuTree,
    naming: &MenuNaming,
    app_name: &str,
    app_uuid: &Uuid,
) -> Vec<StructuralRecord> {
    let mut groups: Vec<Vec<StructuralRecord>> = linearize(tree, naming)
        .iter()
        .filter_map(|entry| {
            tree.get(entry.item_id)
                .map(|item| build(item, &entry.link, naming))
        })
        .collect();
    groups.push(vec![StructuralRecord::application(app_name, app_uuid)]);
    groups.reverse();
    groups.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::item::BooleanNaming;
    use std::collections::HashSet;

    fn uuid() -> Uuid {
        Uuid::parse_str("4db505d0-e5e5-4a7f-8f44-9d1b2c3a4e5f").unwrap()
    }

    fn sample() -> MenuTree {
        let mut t = MenuTree::new();
        t.add(ROOT_ID, MenuItem::new(1, "Settings", ItemKind::SubMenu { secured: false }))
            .unwrap();
        t.add(
            1,
            MenuItem::new(
                2,
                "Brightness",
                ItemKind::Analog { max_value: 100, offset: 0, divisor: 1, unit_name: "%".into() },
            )
            .with_eeprom(4),
        )
        .unwrap();
        t.add(1, MenuItem::new(3, "Mode", ItemKind::Enum { choices: vec!["Eco".into(), "Max".into()] }))
            .unwrap();
        t.add(ROOT_ID, MenuItem::new(4, "Status", ItemKind::Action).with_function("onStatus"))
            .unwrap();
        t
    }

    fn raw(r: &StructuralRecord, i: usize) -> &str {
        match &r.elements[i] {
            Element::Raw(s) | Element::Quoted(s) => s,
        }
    }

    #[test]
    fn analog_group_is_info_then_object() {
        let t = sample();
        let naming = MenuNaming::new(&t, false);
        let link = LinkRecord { next: Some("Mode".into()), first_child: None };
        let recs = build(t.get(2).unwrap(), &link, &naming);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].struct_name, "minfoBrightness");
        assert_eq!(recs[0].elements[0], Element::Quoted("Brightness".into()));
        assert_eq!(raw(&recs[0], 2), "4");
        assert_eq!(raw(&recs[0], 4), "NO_CALLBACK");
        assert!(recs[0].prog_mem && !recs[0].requires_extern);
        assert_eq!(recs[1].struct_name, "menuBrightness");
        assert_eq!(raw(&recs[1], 2), "&menuMode");
        assert!(recs[1].requires_extern);
    }

    #[test]
    fn boolean_uses_naming_constant() {
        let item = MenuItem::new(9, "Power", ItemKind::Boolean { naming: BooleanNaming::OnOff });
        let mut t = MenuTree::new();
        t.add(ROOT_ID, item.clone()).unwrap();
        let naming = MenuNaming::new(&t, false);
        let recs = build(&item, &LinkRecord { next: None, first_child: None }, &naming);
        assert_eq!(raw(&recs[0], 5), "NAMING_ON_OFF");
        assert_eq!(raw(&recs[0], 2), "0xffff");
        assert_eq!(raw(&recs[1], 2), "NULL");
    }

    #[test]
    fn sub_menu_links_back_item_to_first_child() {
        let t = sample();
        let naming = MenuNaming::new(&t, false);
        let link = LinkRecord {
            next: Some("Status".into()),
            first_child: Some(Some("Brightness".into())),
        };
        let recs = build(t.get(1).unwrap(), &link, &naming);
        let names: Vec<_> = recs.iter().map(|r| r.struct_name.as_str()).collect();
        assert_eq!(names, vec!["minfoSettings", "fnSettingsRtCall", "menuBackSettings", "menuSettings"]);
        assert_eq!(raw(&recs[2], 1), "&menuBrightness");
        assert_eq!(raw(&recs[3], 1), "&menuBackSettings");
        assert_eq!(raw(&recs[3], 2), "&menuStatus");
    }

    #[test]
    fn application_record_comes_first() {
        let t = sample();
        let naming = MenuNaming::new(&t, false);
        let recs = generate_menus_in_order(&t, &naming, "Demo", &uuid());
        let first = &recs[0];
        assert_eq!(first.struct_name, "applicationInfo");
        assert_eq!(first.item_id, ROOT_ID);
        assert!(first.prog_mem && first.requires_extern);
        assert_eq!(first.elements[1], Element::Quoted(uuid().to_string()));
    }

    #[test]
    fn every_reference_is_defined_before_use() {
        let t = sample();
        let naming = MenuNaming::new(&t, false);
        let recs = generate_menus_in_order(&t, &naming, "Demo", &uuid());

        let mut defined: HashSet<String> = HashSet::new();
        for r in &recs {
            for e in &r.elements {
                if let Element::Raw(v) = e {
                    if let Some(target) = v.strip_prefix('&') {
                        assert!(defined.contains(target), "{} used before definition in {}", target, r.struct_name);
                    }
                }
            }
            defined.insert(r.struct_name.clone());
        }
        // the group order is reversed pre-order: Status, Mode, Brightness, Settings
        let objects: Vec<_> = recs
            .iter()
            .filter(|r| r.requires_extern && r.item_id != ROOT_ID && r.struct_type != "BackMenuItem")
            .map(|r| r.struct_name.as_str())
            .collect();
        assert_eq!(objects, vec!["menuStatus", "menuMode", "menuBrightness", "menuSettings"]);
    }
}
