use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use uuid::Uuid;

use crate::menu::{item::MenuItem, tree::MenuTree};
use crate::plugins::{platform::EmbeddedPlatform, properties::LastProperty};

fn default_app_name() -> String {
    "New app".to_string()
}

/// Choices made for code generation; persisted with the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOptions {
    #[serde(default)]
    pub platform: EmbeddedPlatform,
    #[serde(default = "default_app_name")]
    pub application_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_uuid: Option<Uuid>,
    #[serde(default)]
    pub naming_recursive: bool,
    #[serde(default)]
    pub save_to_src: bool,
    #[serde(default)]
    pub use_cpp_main: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_remote: Option<String>,
    #[serde(default)]
    pub last_properties: Vec<LastProperty>,
    /// Support files written by the previous run, so stale ones can be removed.
    #[serde(default)]
    pub last_plugin_files: Vec<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            platform: EmbeddedPlatform::default(),
            application_name: default_app_name(),
            application_uuid: None,
            naming_recursive: false,
            save_to_src: false,
            use_cpp_main: false,
            last_display: None,
            last_input: None,
            last_remote: None,
            last_properties: Vec::new(),
            last_plugin_files: Vec::new(),
        }
    }
}

impl GeneratorOptions {
    /// Selected plugin ids in display, input, remote order.
    pub fn selected_plugins(&self) -> impl Iterator<Item = &str> {
        [&self.last_display, &self.last_input, &self.last_remote]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }

    /// The stored UUID, creating one when the project never had one.
    /// Returns whether a new id was assigned.
    pub fn ensure_uuid(&mut self) -> (Uuid, bool) {
        match self.application_uuid {
            Some(id) => (id, false),
            None => {
                let id = Uuid::new_v4();
                self.application_uuid = Some(id);
                (id, true)
            }
        }
    }
}

/// A menu item plus the id of the sub menu (or root) that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    pub parent_id: u16,
    pub item: MenuItem,
}

/// On-disk project: flat item list in tree order plus generator options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default)]
    pub items: Vec<ProjectItem>,
    #[serde(default)]
    pub code_options: GeneratorOptions,
}

impl ProjectFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        serde_json::from_str(&content).map_err(|e| format!("parse {}: {e}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("serialize project: {e}"))?;
        fs::write(path, json).map_err(|e| format!("write {}: {e}", path.display()))
    }

    /// Build the arena. Items must appear after their parent.
    pub fn to_tree(&self) -> Result<MenuTree, String> {
        let mut tree = MenuTree::new();
        for entry in &self.items {
            tree.add(entry.parent_id, entry.item.clone())?;
        }
        Ok(tree)
    }
}
