use serde::{Deserialize, Serialize};

/// Id reserved for the root sentinel. Never emitted as an item.
pub const ROOT_ID: u16 = 0;

/// How a boolean item labels its two states on the device.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BooleanNaming {
    #[default]
    TrueFalse,
    OnOff,
    YesNo,
}

impl BooleanNaming {
    /// Runtime constant understood by `BooleanMenuInfo`.
    pub fn runtime_constant(&self) -> &'static str {
        match self {
            BooleanNaming::TrueFalse => "NAMING_TRUE_FALSE",
            BooleanNaming::OnOff => "NAMING_ON_OFF",
            BooleanNaming::YesNo => "NAMING_YES_NO",
        }
    }
}

/// Kind-specific payload of a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ItemKind {
    #[serde(rename_all = "camelCase")]
    Analog {
        max_value: u16,
        #[serde(default)]
        offset: i32,
        #[serde(default = "default_divisor")]
        divisor: u16,
        #[serde(default)]
        unit_name: String,
    },
    Enum {
        choices: Vec<String>,
    },
    Boolean {
        #[serde(default)]
        naming: BooleanNaming,
    },
    #[serde(rename_all = "camelCase")]
    Float {
        #[serde(default)]
        decimal_places: u8,
    },
    Action,
    #[serde(rename_all = "camelCase")]
    Text {
        text_length: u8,
    },
    IpAddress,
    #[serde(rename_all = "camelCase")]
    RuntimeList {
        #[serde(default)]
        initial_rows: u16,
    },
    SubMenu {
        #[serde(default)]
        secured: bool,
    },
}

fn default_divisor() -> u16 {
    1
}

fn default_true() -> bool {
    true
}

fn default_eeprom() -> i32 {
    -1
}

/// One node of the menu tree, either a leaf control or a sub menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: u16,
    pub name: String,
    #[serde(default = "default_eeprom")]
    pub eeprom_address: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub local_only: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl MenuItem {
    pub fn new(id: u16, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id,
            name: name.into(),
            eeprom_address: -1,
            function_name: None,
            read_only: false,
            local_only: false,
            visible: true,
            kind,
        }
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn with_eeprom(mut self, address: i32) -> Self {
        self.eeprom_address = address;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn local_only(mut self) -> Self {
        self.local_only = true;
        self
    }

    pub fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Sub menus are the only containers; an empty one is still a container.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, ItemKind::SubMenu { .. })
    }

    pub fn is_secured(&self) -> bool {
        matches!(self.kind, ItemKind::SubMenu { secured: true })
    }

    /// Items whose runtime structure is backed by a render function.
    pub fn needs_runtime_structure(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Text { .. } | ItemKind::IpAddress | ItemKind::RuntimeList { .. }
        )
    }

    /// The user supplied callback, ignoring blank names.
    pub fn callback(&self) -> Option<&str> {
        self.function_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
