//! Core library for generating embedded menu code from a menu tree.
//!
//! This crate is UI-agnostic. It exposes:
//! - `menu`: the item model, the tree arena and the JSON project file.
//! - `plugins`: feature descriptors (creators), their properties and target boards.
//! - `generator`: naming, linearization, structure records, callbacks, emit and the conversion pass.
//! - `arduino`: entry point adjustment and library version checks.
//! - `core_log::CoreLog`: thin logging trait the host (CLI or UI) can implement.
//!
//! Import the `prelude` if you want the most common types in scope.

pub mod core_log;

pub mod arduino;
pub mod generator;
pub mod menu;
pub mod plugins;

/// Convenient re-exports for downstream users (CLI/tests).
pub use core_log::CoreLog;

pub mod prelude {
    pub use crate::core_log::{CoreLog, MemoryLog, NoopLog};

    // Menu model
    pub use crate::menu::item::{BooleanNaming, ItemKind, MenuItem, ROOT_ID};
    pub use crate::menu::project::{GeneratorOptions, ProjectFile, ProjectItem};
    pub use crate::menu::tree::MenuTree;

    // Plugins
    pub use crate::plugins::creator::{CodeCreator, Packaging, RequiredFile};
    pub use crate::plugins::platform::EmbeddedPlatform;
    pub use crate::plugins::properties::{
        CreatorProperty, LastProperty, SubSystem, apply_last_properties, validate_properties,
    };

    // Generation
    pub use crate::generator::error::ConversionError;
    pub use crate::generator::orchestrator::{CodeGenerator, ConversionOutcome, ConversionState};

    // Board collaborators
    pub use crate::arduino::library::{ArduinoLibraryInstaller, LibraryInstaller};
    pub use crate::arduino::sketch::{ArduinoSketchAdjuster, SketchAdjuster};
}
