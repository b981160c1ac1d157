//! Code creators: one per selected feature (display, input, remote).
//!
//! A creator contributes includes, global variables, calls placed in
//! `setupMenu()`, support files copied into the project, and the properties
//! the user can tune. Creators are described by JSON files so new plugins do
//! not need a rebuild.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::plugins::{
    platform::EmbeddedPlatform,
    properties::{CreatorProperty, SubSystem},
};

/// An `#include` line. `global` selects `<...>` over `"..."`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderDefinition {
    pub name: String,
    #[serde(default = "default_global")]
    pub global: bool,
}

fn default_global() -> bool {
    true
}

impl HeaderDefinition {
    pub fn global(name: impl Into<String>) -> Self {
        Self { name: name.into(), global: true }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Self { name: name.into(), global: false }
    }
}

/// A global variable defined in the source and optionally exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeVariable {
    pub name: String,
    pub object_type: String,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub params: Vec<String>,
}

/// A call emitted inside `setupMenu()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    pub function_name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl FunctionCall {
    pub fn on_object(object: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            object_name: Some(object.into()),
            function_name: function.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, p: impl Into<String>) -> Self {
        self.params.push(p.into());
        self
    }
}

/// Where a support file's bytes come from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Packaging {
    /// Shipped next to the creator's descriptor.
    #[default]
    WithPlugin,
    /// Found inside the installed runtime library.
    WithLibrary,
}

/// A support file the feature needs in the project directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredFile {
    pub file_name: String,
    #[serde(default)]
    pub packaging: Packaging,
    /// Literal token -> replacement, applied in this order.
    #[serde(default)]
    pub replacements: IndexMap<String, String>,
}

impl RequiredFile {
    /// File name without any directory component.
    pub fn base_name(&self) -> String {
        base_name(&self.file_name)
    }
}

pub(crate) fn base_name(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

impl std::fmt::Display for RequiredFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.file_name, self.packaging)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeCreator {
    pub id: String,
    pub name: String,
    pub subsystem: SubSystem,
    #[serde(default)]
    pub includes: Vec<HeaderDefinition>,
    #[serde(default)]
    pub variables: Vec<CodeVariable>,
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
    #[serde(default)]
    pub required_files: Vec<RequiredFile>,
    #[serde(default)]
    pub properties: Vec<CreatorProperty>,
    /// Directory the descriptor came from; bundled files resolve against it.
    #[serde(skip)]
    pub source_dir: Option<PathBuf>,
}

impl CodeCreator {
    /// Built-in creator that always runs first and pulls in the platform and
    /// runtime library headers.
    pub fn globals(platform: EmbeddedPlatform) -> Self {
        let platform_header = if platform.is_arduino() { "Arduino.h" } else { "mbed.h" };
        CodeCreator {
            id: "globals".into(),
            name: "Platform globals".into(),
            subsystem: SubSystem::Globals,
            includes: vec![
                HeaderDefinition::global(platform_header),
                HeaderDefinition::global("tcMenu.h"),
            ],
            variables: Vec::new(),
            function_calls: Vec::new(),
            required_files: Vec::new(),
            properties: Vec::new(),
            source_dir: None,
        }
    }

    /// Load one descriptor; `source_dir` is set to the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let mut creator: CodeCreator = serde_json::from_str(&content)
            .map_err(|e| format!("parse {}: {e}", path.display()))?;
        creator.source_dir = path.parent().map(Path::to_path_buf);
        Ok(creator)
    }

    /// Load `<dir>/<id>.json`, falling back to `<dir>/<id>/plugin.json`.
    pub fn load_by_id(dir: &Path, id: &str) -> Result<Self, String> {
        let flat = dir.join(format!("{id}.json"));
        if flat.is_file() {
            return Self::load(flat);
        }
        let nested = dir.join(id).join("plugin.json");
        if nested.is_file() {
            return Self::load(nested);
        }
        Err(format!("plugin '{id}' not found under {}", dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults_and_replacement_order() {
        let json = r#"{
            "id": "lcd", "name": "LCD backpack", "subsystem": "DISPLAY",
            "includes": [{"name": "LiquidCrystalIO.h"}, {"name": "lcdTheme.h", "global": false}],
            "requiredFiles": [{
                "fileName": "src/lcdRenderer.cpp",
                "replacements": {"ZZZZ": "lcd", "AAAA": "20"}
            }]
        }"#;
        let c: CodeCreator = serde_json::from_str(json).unwrap();
        assert!(c.includes[0].global);
        assert!(!c.includes[1].global);
        let file = &c.required_files[0];
        assert_eq!(file.packaging, Packaging::WithPlugin);
        assert_eq!(file.base_name(), "lcdRenderer.cpp");
        let keys: Vec<_> = file.replacements.keys().cloned().collect();
        assert_eq!(keys, vec!["ZZZZ", "AAAA"]);
    }

    #[test]
    fn globals_follow_platform() {
        let avr = CodeCreator::globals(EmbeddedPlatform::ArduinoAvr);
        assert_eq!(avr.includes[0].name, "Arduino.h");
        let mbed = CodeCreator::globals(EmbeddedPlatform::MbedRtos);
        assert_eq!(mbed.includes[0].name, "mbed.h");
    }
}
