//! Creator properties: the user-editable settings each plugin exposes, and the
//! rules that decide whether a value may be written into generated code.

use core::fmt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static STR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}\s\-_*%()]*$").expect("valid string pattern"));
static VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_]*$").expect("valid variable pattern"));

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubSystem {
    Display,
    Input,
    Remote,
    Globals,
}

impl SubSystem {
    pub fn name(&self) -> &'static str {
        match self {
            SubSystem::Display => "DISPLAY",
            SubSystem::Input => "INPUT",
            SubSystem::Remote => "REMOTE",
            SubSystem::Globals => "GLOBALS",
        }
    }
}

impl fmt::Display for SubSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a property surfaces in the generated code.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    /// Written as `#define NAME VALUE` in the header.
    #[default]
    Define,
    /// Only available to `${NAME}` expansion in variables and calls.
    Variable,
    /// Like `Variable`, but expanded as a quoted string.
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum ValidationRules {
    #[serde(rename_all = "camelCase")]
    String { max_len: usize },
    #[serde(rename_all = "camelCase")]
    Variable { max_len: usize },
    Int { min: i64, max: i64 },
    Boolean,
    Choice { choices: Vec<String> },
}

impl ValidationRules {
    pub fn is_value_valid(&self, value: &str) -> bool {
        match self {
            ValidationRules::String { max_len } => {
                value.chars().count() <= *max_len && STR_PATTERN.is_match(value)
            }
            ValidationRules::Variable { max_len } => {
                value.chars().count() <= *max_len && VAR_PATTERN.is_match(value)
            }
            ValidationRules::Int { min, max } => value
                .trim()
                .parse::<i64>()
                .is_ok_and(|v| v >= *min && v <= *max),
            ValidationRules::Boolean => matches!(value, "true" | "false"),
            ValidationRules::Choice { choices } => choices.iter().any(|c| c == value),
        }
    }
}

impl fmt::Display for ValidationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRules::String { max_len } => {
                write!(f, "String validator (max length {max_len})")
            }
            ValidationRules::Variable { max_len } => {
                write!(f, "Variable validator (max length {max_len})")
            }
            ValidationRules::Int { min, max } => write!(f, "Integer validator ({min}..={max})"),
            ValidationRules::Boolean => f.write_str("Boolean validator"),
            ValidationRules::Choice { choices } => {
                write!(f, "Choice validator ({})", choices.join("|"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProperty {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub subsystem: SubSystem,
    #[serde(default)]
    pub kind: PropertyKind,
    pub initial: String,
    /// Current value; `None` means the initial value applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub validation: ValidationRules,
}

impl CreatorProperty {
    pub fn latest_value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.initial)
    }

    pub fn reset_to_initial(&mut self) {
        self.value = None;
    }
}

/// A value remembered from a previous run, matched by name and subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastProperty {
    pub name: String,
    pub subsystem: SubSystem,
    pub latest_value: String,
}

impl From<&CreatorProperty> for LastProperty {
    fn from(p: &CreatorProperty) -> Self {
        LastProperty {
            name: p.name.clone(),
            subsystem: p.subsystem,
            latest_value: p.latest_value().to_string(),
        }
    }
}

/// Reset every property to its initial value, then restore any value saved
/// by an earlier run for the same name and subsystem.
pub fn apply_last_properties(props: &mut [CreatorProperty], last: &[LastProperty]) {
    for prop in props.iter_mut() {
        prop.reset_to_initial();
        if let Some(saved) = last
            .iter()
            .find(|l| l.name == prop.name && l.subsystem == prop.subsystem)
        {
            prop.value = Some(saved.latest_value.clone());
        }
    }
}

/// Check every property; returns one message per invalid value.
pub fn validate_properties<'a>(
    props: impl IntoIterator<Item = &'a CreatorProperty>,
) -> Result<(), Vec<String>> {
    let errors: Vec<String> = props
        .into_iter()
        .filter(|p| !p.validation.is_value_valid(p.latest_value()))
        .map(|p| {
            format!(
                "{}/{}: value '{}' rejected by {}",
                p.subsystem,
                p.name,
                p.latest_value(),
                p.validation
            )
        })
        .collect();
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
