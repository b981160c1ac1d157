//! Token formatting for generated code, behind a trait so the emitter does not
//! know the target language's syntax.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::generator::{
    format::FORMAT,
    structure::{Element, StructShape, StructuralRecord},
};
use crate::plugins::{
    creator::{CodeVariable, FunctionCall, HeaderDefinition},
    properties::{CreatorProperty, PropertyKind},
};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("valid placeholder pattern"));

pub trait CodeVariableExtractor {
    fn map_includes(&self, includes: &[HeaderDefinition]) -> String;
    fn map_defines(&self) -> String;
    fn map_exports(&self, variables: &[CodeVariable]) -> String;
    fn map_variables(&self, variables: &[CodeVariable]) -> String;
    fn map_functions(&self, calls: &[FunctionCall]) -> String;
    fn map_struct_source(&self, record: &StructuralRecord) -> String;
    /// Forward declaration for a record, or an empty string when none is needed.
    fn map_struct_header(&self, record: &StructuralRecord) -> String;
}

/// Values plugin parameters can refer to as `${NAME}`.
pub struct CodeConversionContext {
    pub root_variable: String,
    pub properties: Vec<CreatorProperty>,
}

pub struct CppExtractor {
    context: CodeConversionContext,
    uses_progmem: bool,
}

impl CppExtractor {
    pub fn new(context: CodeConversionContext, uses_progmem: bool) -> Self {
        Self { context, uses_progmem }
    }

    /// Expand `${ROOT}` and `${PROPERTY}` placeholders; unknown names are kept.
    pub fn expand(&self, param: &str) -> String {
        PLACEHOLDER
            .replace_all(param, |caps: &Captures| {
                let key = &caps[1];
                if key == "ROOT" {
                    return self.context.root_variable.clone();
                }
                match self.context.properties.iter().find(|p| p.name == key) {
                    Some(p) if p.kind == PropertyKind::Text => quote(p.latest_value()),
                    Some(p) => p.latest_value().to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn param_list(&self, params: &[String]) -> String {
        params
            .iter()
            .map(|p| self.expand(p))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn progmem_word(&self) -> &'static str {
        if self.uses_progmem { "PROGMEM " } else { "" }
    }

    fn elements(&self, record: &StructuralRecord) -> String {
        record
            .elements
            .iter()
            .map(|e| match e {
                Element::Quoted(s) => quote(s),
                Element::Raw(s) => s.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn string_table(&self, record: &StructuralRecord) -> String {
        let lb = FORMAT.line_break;
        let pm = if record.prog_mem && self.uses_progmem { " PROGMEM" } else { "" };
        let name = &record.struct_name;
        let mut lines = Vec::with_capacity(record.elements.len() + 1);
        let mut entries = Vec::with_capacity(record.elements.len());
        for (i, e) in record.elements.iter().enumerate() {
            let text = match e {
                Element::Quoted(s) => quote(s),
                Element::Raw(s) => s.clone(),
            };
            lines.push(format!("const char {name}_{i}[]{pm} = {text};"));
            entries.push(format!("{name}_{i}"));
        }
        lines.push(format!(
            "const char* const {name}[]{pm} = {{ {} }};",
            entries.join(", ")
        ));
        lines.join(lb)
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl CodeVariableExtractor for CppExtractor {
    fn map_includes(&self, includes: &[HeaderDefinition]) -> String {
        let unique: IndexSet<&HeaderDefinition> = includes.iter().collect();
        unique
            .into_iter()
            .map(|h| {
                if h.global {
                    format!("#include <{}>", h.name)
                } else {
                    format!("#include \"{}\"", h.name)
                }
            })
            .collect::<Vec<_>>()
            .join(FORMAT.line_break)
    }

    fn map_defines(&self) -> String {
        self.context
            .properties
            .iter()
            .filter(|p| p.kind == PropertyKind::Define)
            .map(|p| format!("#define {} {}", p.name, p.latest_value()))
            .collect::<Vec<_>>()
            .join(FORMAT.line_break)
    }

    fn map_exports(&self, variables: &[CodeVariable]) -> String {
        variables
            .iter()
            .filter(|v| v.exported)
            .map(|v| format!("extern {} {};", v.object_type, v.name))
            .collect::<Vec<_>>()
            .join(FORMAT.line_break)
    }

    fn map_variables(&self, variables: &[CodeVariable]) -> String {
        variables
            .iter()
            .map(|v| {
                if v.params.is_empty() {
                    format!("{} {};", v.object_type, v.name)
                } else {
                    format!("{} {}({});", v.object_type, v.name, self.param_list(&v.params))
                }
            })
            .collect::<Vec<_>>()
            .join(FORMAT.line_break)
    }

    fn map_functions(&self, calls: &[FunctionCall]) -> String {
        calls
            .iter()
            .map(|c| {
                let target = match &c.object_name {
                    Some(obj) => format!("{}.{}", self.expand(obj), c.function_name),
                    None => c.function_name.clone(),
                };
                format!("    {target}({});", self.param_list(&c.params))
            })
            .collect::<Vec<_>>()
            .join(FORMAT.line_break)
    }

    fn map_struct_source(&self, record: &StructuralRecord) -> String {
        match record.shape {
            StructShape::Info => {
                let pm = if record.prog_mem { self.progmem_word() } else { "" };
                format!(
                    "const {pm}{} {} = {{ {} }};",
                    record.struct_type,
                    record.struct_name,
                    self.elements(record)
                )
            }
            StructShape::Object => format!(
                "{} {}({});",
                record.struct_type,
                record.struct_name,
                self.elements(record)
            ),
            StructShape::Macro => format!("{}({})", record.struct_type, self.elements(record)),
            StructShape::StringChoices => self.string_table(record),
        }
    }

    fn map_struct_header(&self, record: &StructuralRecord) -> String {
        if !record.requires_extern {
            return String::new();
        }
        let constness = if record.shape == StructShape::Info { "const " } else { "" };
        format!("extern {constness}{} {};", record.struct_type, record.struct_name)
    }
}
