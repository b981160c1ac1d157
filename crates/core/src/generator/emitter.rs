//! Writes `<project>_menu.h` and `<project>_menu.cpp`.
//!
//! Rendering is pure (`render_header` / `render_source`); the `emit_*`
//! functions only own the file handle, so the file is closed on every path.

use std::{
    collections::{BTreeMap, HashSet},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::generator::{
    callbacks::{self, CallbackRequirement},
    error::ConversionError,
    extractor::CodeVariableExtractor,
    format::{FORMAT, HEADER_GUARD, RUNTIME_HEADER},
    naming::MenuNaming,
    structure::StructuralRecord,
};
use crate::menu::tree::MenuTree;
use crate::plugins::creator::{CodeCreator, CodeVariable, FunctionCall, HeaderDefinition};

/// Everything both generated files are rendered from.
pub struct EmitInput<'a> {
    pub project_name: &'a str,
    pub creators: &'a [CodeCreator],
    pub records: &'a [StructuralRecord],
    pub callbacks: &'a BTreeMap<u16, CallbackRequirement>,
    pub extractor: &'a dyn CodeVariableExtractor,
    pub tree: &'a MenuTree,
    pub naming: &'a MenuNaming<'a>,
}

impl EmitInput<'_> {
    fn variables(&self) -> Vec<CodeVariable> {
        self.creators.iter().flat_map(|c| c.variables.iter().cloned()).collect()
    }

    fn includes(&self) -> Vec<HeaderDefinition> {
        let mut all: Vec<HeaderDefinition> =
            self.creators.iter().flat_map(|c| c.includes.iter().cloned()).collect();
        all.extend(
            self.records
                .iter()
                .flat_map(|r| r.header_requirements.iter().cloned()),
        );
        all
    }

    fn function_calls(&self) -> Vec<FunctionCall> {
        self.creators
            .iter()
            .flat_map(|c| c.function_calls.iter().cloned())
            .collect()
    }
}

pub fn render_header(input: &EmitInput) -> String {
    let lb = FORMAT.line_break;
    let two = &FORMAT.two_lines;
    let ex = input.extractor;
    let mut out = String::with_capacity(4096);

    out.push_str(&FORMAT.banner);
    out.push_str(&format!("#ifndef {HEADER_GUARD}{lb}#define {HEADER_GUARD}{two}"));

    out.push_str(&ex.map_includes(&input.includes()));

    out.push_str(&format!("{two}// all define statements needed{lb}"));
    out.push_str(&ex.map_defines());

    out.push_str(&format!("{two}// all variables that need exporting{lb}"));
    out.push_str(&ex.map_exports(&input.variables()));

    out.push_str(&format!("{two}// all menu item forward references.{lb}"));
    let forwards: Vec<String> = input
        .records
        .iter()
        .map(|r| ex.map_struct_header(r))
        .filter(|h| !h.is_empty())
        .collect();
    out.push_str(&forwards.join(lb));
    out.push_str(two);

    out.push_str(&format!(
        "// Callback functions must always include CALLBACK_FUNCTION after the return type{lb}#define CALLBACK_FUNCTION{two}"
    ));
    for cb in callbacks::sorted(input.callbacks) {
        if !cb.header.is_empty() {
            out.push_str(&cb.header);
            out.push_str(lb);
        }
    }

    out.push_str(&format!("{lb}void setupMenu();{lb}"));
    out.push_str(&format!("{lb}#endif // {HEADER_GUARD}{lb}"));
    out
}

pub fn render_source(input: &EmitInput) -> String {
    let lb = FORMAT.line_break;
    let two = &FORMAT.two_lines;
    let ex = input.extractor;
    let mut out = String::with_capacity(8192);

    out.push_str(&FORMAT.banner);
    out.push_str(&format!("#include <{RUNTIME_HEADER}>{lb}"));
    out.push_str(&format!("#include \"{}_menu.h\"", input.project_name));

    out.push_str(&format!("{two}// Global variable declarations{two}"));
    out.push_str(&ex.map_variables(&input.variables()));

    out.push_str(&format!("{two}// Global Menu Item declarations{two}"));
    let mut scaffolded: HashSet<u16> = HashSet::new();
    for record in input.records {
        if let Some(cb) = input.callbacks.get(&record.item_id) {
            if scaffolded.insert(record.item_id) && !cb.source.is_empty() {
                out.push_str(&cb.source.join(lb));
                out.push_str(lb);
            }
        }
        out.push_str(&ex.map_struct_source(record));
        out.push_str(lb);
    }

    out.push_str(&format!("{lb}// Set up code{two}"));
    out.push_str(&format!("void setupMenu() {{{lb}"));
    out.push_str(&ex.map_functions(&input.function_calls()));

    let state_calls = state_function_calls(input.tree, input.naming);
    if !state_calls.is_empty() {
        out.push_str(&format!("{two}    // Read only and local only function calls{lb}"));
        out.push_str(&ex.map_functions(&state_calls));
    }

    out.push_str(&format!("{lb}}}{lb}{lb}"));
    out
}

/// Calls that put flagged items into their non-default state. Four categories
/// in a fixed order; an item appears once per flag it carries.
pub fn state_function_calls(tree: &MenuTree, naming: &MenuNaming) -> Vec<FunctionCall> {
    let items = tree.all_items();
    let call = |id: u16, function: &str, value: &str| {
        FunctionCall::on_object(naming.variable_name(id), function).param(value)
    };

    let mut calls = Vec::new();
    calls.extend(items.iter().filter(|i| i.read_only).map(|i| call(i.id, "setReadOnly", "true")));
    calls.extend(items.iter().filter(|i| i.local_only).map(|i| call(i.id, "setLocalOnly", "true")));
    calls.extend(items.iter().filter(|i| i.is_secured()).map(|i| call(i.id, "setSecured", "true")));
    calls.extend(items.iter().filter(|i| !i.visible).map(|i| call(i.id, "setVisible", "false")));
    calls
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(content.as_bytes())?;
    writer.flush()
}

pub fn emit_header(path: &Path, input: &EmitInput) -> Result<(), ConversionError> {
    write_file(path, &render_header(input)).map_err(|source| ConversionError::Generation {
        file: path.to_path_buf(),
        source,
    })
}

pub fn emit_source(path: &Path, input: &EmitInput) -> Result<(), ConversionError> {
    write_file(path, &render_source(input)).map_err(|source| ConversionError::Generation {
        file: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{
        extractor::{CodeConversionContext, CppExtractor},
        structure::generate_menus_in_order,
    };
    use crate::menu::item::{ItemKind, MenuItem, ROOT_ID};
    use crate::plugins::platform::EmbeddedPlatform;
    use uuid::Uuid;

    fn tree() -> MenuTree {
        let mut t = MenuTree::new();
        t.add(ROOT_ID, MenuItem::new(1, "Settings", ItemKind::SubMenu { secured: true }))
            .unwrap();
        t.add(1, MenuItem::new(2, "Ssid", ItemKind::Text { text_length: 10 }))
            .unwrap();
        t.add(
            ROOT_ID,
            MenuItem::new(3, "Status", ItemKind::Action)
                .with_function("onStatus")
                .read_only()
                .local_only(),
        )
        .unwrap();
        t
    }

    fn render(t: &MenuTree) -> (String, String) {
        let naming = MenuNaming::new(t, false);
        let records = generate_menus_in_order(t, &naming, "Demo", &Uuid::nil());
        let cbs = callbacks::collect(t, &naming);
        let creators = vec![CodeCreator::globals(EmbeddedPlatform::ArduinoAvr)];
        let ex = CppExtractor::new(
            CodeConversionContext { root_variable: naming.root_variable(), properties: vec![] },
            true,
        );
        let input = EmitInput {
            project_name: "demo",
            creators: &creators,
            records: &records,
            callbacks: &cbs,
            extractor: &ex,
            tree: t,
            naming: &naming,
        };
        (render_header(&input), render_source(&input))
    }

    #[test]
    fn header_sections_in_order() {
        let t = tree();
        let (h, _) = render(&t);
        let pos = |needle: &str| h.find(needle).unwrap_or_else(|| panic!("missing {needle}"));
        assert!(h.starts_with("/*"));
        assert!(pos("#ifndef MENU_GENERATED_CODE_H") < pos("#include <Arduino.h>"));
        assert!(pos("#include <tcMenu.h>") < pos("#include <RuntimeMenuItem.h>"));
        assert!(pos("#include <RuntimeMenuItem.h>") < pos("// all define statements"));
        assert!(pos("// all menu item forward references.") < pos("extern const ConnectorLocalInfo applicationInfo;"));
        assert!(pos("extern SubMenuItem menuSettings;") < pos("#define CALLBACK_FUNCTION"));
        assert!(pos("void CALLBACK_FUNCTION onStatus(int id);") < pos("void setupMenu();"));
        assert!(h.trim_end().ends_with("#endif // MENU_GENERATED_CODE_H"));
        assert_eq!(h.matches("#include <RuntimeMenuItem.h>").count(), 1);
    }

    #[test]
    fn source_places_scaffolding_before_item() {
        let t = tree();
        let (_, s) = render(&t);
        let lines: Vec<&str> = s.lines().collect();
        let idx = lines
            .iter()
            .position(|l| l.starts_with("RENDERING_CALLBACK_NAME_INVOKE(fnSsidRtCall, textItemRenderFn"))
            .unwrap();
        assert_eq!(lines[idx + 1], "TextMenuItem menuSsid(fnSsidRtCall, 2, 10, NULL);");
        assert_eq!(s.matches("fnSsidRtCall, textItemRenderFn").count(), 1);
        let includes: Vec<&str> = lines.iter().filter(|l| l.starts_with("#include")).copied().collect();
        assert_eq!(includes, vec!["#include <tcMenu.h>", "#include \"demo_menu.h\""]);
    }

    #[test]
    fn flagged_items_get_one_call_per_flag() {
        let t = tree();
        let (_, s) = render(&t);
        assert_eq!(s.matches("// Read only and local only function calls").count(), 1);
        assert!(s.contains("    menuStatus.setReadOnly(true);"));
        assert!(s.contains("    menuStatus.setLocalOnly(true);"));
        assert!(s.contains("    menuSettings.setSecured(true);"));
        assert!(!s.contains("setVisible"));
        assert_eq!(s.matches("menuStatus.set").count(), 2);
    }

    #[test]
    fn no_state_comment_without_flags() {
        let mut t = MenuTree::new();
        t.add(ROOT_ID, MenuItem::new(1, "Go", ItemKind::Action)).unwrap();
        let (_, s) = render(&t);
        assert!(!s.contains("Read only and local only"));
        assert!(s.contains("void setupMenu() {"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let t = tree();
        assert_eq!(render(&t), render(&t));
    }
}
