//! One conversion pass: menu tree in, generated files on disk.
//!
//! ```text
//! Start -> Preparing -> GeneratingHeader -> GeneratingSource
//!       -> PatchingEntryPoint -> ProvisioningPlugins -> PostChecks -> Done
//! ```
//! Any fatal error moves straight to `Failed`; post-checks only warn.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::warn;
use uuid::Uuid;

use crate::CoreLog;
use crate::core_log::TimestampedLog;
use crate::arduino::{library::LibraryInstaller, sketch::SketchAdjuster};
use crate::generator::{
    callbacks,
    emitter::{self, EmitInput},
    error::ConversionError,
    extractor::{CodeConversionContext, CppExtractor},
    naming::MenuNaming,
    provision::PluginProvisioner,
    structure::generate_menus_in_order,
};
use crate::menu::{project::GeneratorOptions, tree::MenuTree};
use crate::plugins::creator::CodeCreator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    Start,
    Preparing,
    GeneratingHeader,
    GeneratingSource,
    PatchingEntryPoint,
    ProvisioningPlugins,
    PostChecks,
    Done,
    Failed,
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Files that were provisioned; store them for the next run.
    Completed { plugin_files: Vec<String> },
    /// The state the pass was in when it gave up.
    Failed { at: ConversionState },
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Completed { .. })
    }
}

pub struct CodeGenerator {
    adjuster: Box<dyn SketchAdjuster>,
    installer: Box<dyn LibraryInstaller>,
    options: GeneratorOptions,
    /// Caller's sink behind a timestamp; every step and collaborator writes here.
    steps: Arc<dyn CoreLog>,
    log_location: Option<PathBuf>,
}

impl CodeGenerator {
    pub fn new(
        adjuster: Box<dyn SketchAdjuster>,
        installer: Box<dyn LibraryInstaller>,
        options: GeneratorOptions,
        logger: Arc<dyn CoreLog>,
    ) -> Self {
        Self {
            adjuster,
            installer,
            options,
            steps: Arc::new(TimestampedLog::new(logger)),
            log_location: None,
        }
    }

    /// Where the persistent log lives; mentioned when a pass fails.
    pub fn with_log_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_location = Some(path.into());
        self
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Run a full pass over `directory`. The project name is the directory's
    /// final component. `creators` are the user selected features; the
    /// platform globals creator is put in front of them.
    pub fn start_conversion(
        &self,
        directory: &Path,
        creators: &[CodeCreator],
        tree: &MenuTree,
        previous_files: &[String],
    ) -> ConversionOutcome {
        let mut state = ConversionState::Start;
        self.log_line(&format!("Starting {} generate: {}", self.options.platform, directory.display()));

        match self.convert(&mut state, directory, creators, tree, previous_files) {
            Ok(plugin_files) => {
                self.enter(&mut state, ConversionState::Done);
                self.log_line("Process has completed, make sure the code in your IDE is up-to-date.");
                self.log_line("You may need to close the project and then re-open it to pick up changes..");
                ConversionOutcome::Completed { plugin_files }
            }
            Err(e) => {
                let at = state;
                self.report_failure(&e);
                self.enter(&mut state, ConversionState::Failed);
                ConversionOutcome::Failed { at }
            }
        }
    }

    fn convert(
        &self,
        state: &mut ConversionState,
        directory: &Path,
        creators: &[CodeCreator],
        tree: &MenuTree,
        previous_files: &[String],
    ) -> Result<Vec<String>, ConversionError> {
        self.enter(state, ConversionState::Preparing);
        let project_name = project_name(directory);
        let src_dir = if self.options.save_to_src {
            directory.join("src")
        } else {
            directory.to_path_buf()
        };
        fs::create_dir_all(&src_dir).map_err(|source| ConversionError::Generation {
            file: src_dir.clone(),
            source,
        })?;

        let mut all_creators = Vec::with_capacity(creators.len() + 1);
        all_creators.push(CodeCreator::globals(self.options.platform));
        all_creators.extend(creators.iter().cloned());

        let naming = MenuNaming::new(tree, self.options.naming_recursive);
        let uuid = self.options.application_uuid.unwrap_or_else(|| {
            self.steps.warn("Project has no application UUID, a random one is used for this run");
            Uuid::new_v4()
        });
        let records = generate_menus_in_order(tree, &naming, &self.options.application_name, &uuid);
        let callbacks = callbacks::collect(tree, &naming);
        self.log_line(&format!(
            "{} structures and {} callbacks to generate",
            records.len(),
            callbacks.len()
        ));

        let properties = all_creators
            .iter()
            .flat_map(|c| c.properties.iter().cloned())
            .collect();
        let extractor = CppExtractor::new(
            CodeConversionContext {
                root_variable: naming.root_variable(),
                properties,
            },
            self.options.platform.uses_progmem(),
        );
        let input = EmitInput {
            project_name: &project_name,
            creators: &all_creators,
            records: &records,
            callbacks: &callbacks,
            extractor: &extractor,
            tree,
            naming: &naming,
        };

        self.enter(state, ConversionState::GeneratingHeader);
        let header = src_dir.join(format!("{project_name}_menu.h"));
        self.log_line(&format!("Writing out header file: {}", header.display()));
        emitter::emit_header(&header, &input)?;

        self.enter(state, ConversionState::GeneratingSource);
        let source = src_dir.join(format!("{project_name}_menu.cpp"));
        self.log_line(&format!("Writing out source CPP file: {}", source.display()));
        emitter::emit_source(&source, &input)?;

        self.enter(state, ConversionState::PatchingEntryPoint);
        let entry = self.entry_point(directory, &project_name);
        self.log_line(&format!("Making adjustments to {}", entry.display()));
        self.adjuster
            .make_adjustments(&self.steps, &entry, &project_name, &callbacks::sorted(&callbacks))
            .map_err(|source| ConversionError::Patch {
                file: entry.clone(),
                source,
            })?;

        self.enter(state, ConversionState::ProvisioningPlugins);
        let plugin_files = PluginProvisioner::new(&self.steps, self.installer.as_ref())
            .provision(&all_creators, previous_files, &src_dir)?;

        self.enter(state, ConversionState::PostChecks);
        self.check_libraries();
        self.check_legacy_files(directory, &project_name);

        Ok(plugin_files)
    }

    /// `<name>.ino`, or `<name>_main.cpp` for cpp mains and non Arduino boards.
    pub fn entry_point(&self, directory: &Path, project_name: &str) -> PathBuf {
        if self.options.use_cpp_main || !self.options.platform.is_arduino() {
            directory.join(format!("{project_name}_main.cpp"))
        } else {
            directory.join(format!("{project_name}.ino"))
        }
    }

    fn check_libraries(&self) {
        let status = self.installer.status_of_all_libraries();
        if status.is_up_to_date() {
            return;
        }
        self.log_line("WARNING ===============================================================");
        self.log_line("The embedded libraries are not up-to-date, build problems are likely");
        for lib in status.stale() {
            let installed = lib
                .installed
                .as_ref()
                .map_or_else(|| "not installed".to_string(), ToString::to_string);
            self.log_line(&format!("{}: installed {installed}, needs {}", lib.name, lib.required));
        }
        self.log_line("WARNING ===============================================================");
    }

    fn check_legacy_files(&self, directory: &Path, project_name: &str) {
        let legacy_h = directory.join(format!("{project_name}.h"));
        let legacy_cpp = directory.join(format!("{project_name}.cpp"));
        if !legacy_h.exists() && !legacy_cpp.exists() {
            return;
        }
        self.log_line("ERROR: OLD FILES FOUND !!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!");
        self.log_line("POTENTIAL COMPILE ERROR IN IDE - ACTION REQUIRED");
        self.log_line(&format!(
            "Generated code is now in {project_name}_menu.h and {project_name}_menu.cpp"
        ));
        self.log_line(&format!(
            "Remove {} and {} from the project directory",
            legacy_h.display(),
            legacy_cpp.display()
        ));
        self.log_line("ERROR: OLD FILES FOUND !!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!");
        warn!(dir = %directory.display(), "legacy generated files present");
    }

    fn report_failure(&self, e: &ConversionError) {
        self.log_line("ERROR during conversion---------------------------------------------");
        self.log_line(&format!("The conversion process has failed with an error: {e}"));
        if let Some(log) = &self.log_location {
            self.log_line(&format!(
                "A more complete error can be found in the log file in {}",
                log.display()
            ));
        }
        self.steps.error(&e.to_string());
    }

    fn enter(&self, state: &mut ConversionState, next: ConversionState) {
        tracing::debug!(from = %state, to = %next, "conversion state");
        *state = next;
    }

    /// Timestamped progress line to the caller and the persistent log.
    fn log_line(&self, msg: &str) {
        self.steps.info(msg);
    }
}

/// The final component of the project directory.
pub fn project_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arduino::{library::ArduinoLibraryInstaller, sketch::ArduinoSketchAdjuster};
    use crate::core_log::MemoryLog;
    use crate::menu::item::{ItemKind, MenuItem, ROOT_ID};
    use crate::plugins::creator::{Packaging, RequiredFile};
    use crate::plugins::properties::SubSystem;
    use indexmap::IndexMap;

    fn tree() -> MenuTree {
        let mut t = MenuTree::new();
        t.add(ROOT_ID, MenuItem::new(1, "Volume", ItemKind::Analog {
            max_value: 100,
            offset: 0,
            divisor: 1,
            unit_name: "dB".into(),
        }))
        .unwrap();
        t.add(ROOT_ID, MenuItem::new(2, "Settings", ItemKind::SubMenu { secured: false }))
            .unwrap();
        t.add(2, MenuItem::new(3, "Status", ItemKind::Action).with_function("onStatus"))
            .unwrap();
        t
    }

    fn generator(libs: &Path, log: Arc<dyn CoreLog>, options: GeneratorOptions) -> CodeGenerator {
        CodeGenerator::new(
            Box::new(ArduinoSketchAdjuster::new()),
            Box::new(ArduinoLibraryInstaller::new(Some(libs.to_path_buf()))),
            options,
            log,
        )
    }

    fn options() -> GeneratorOptions {
        GeneratorOptions {
            application_name: "Demo".into(),
            application_uuid: Some(Uuid::nil()),
            ..GeneratorOptions::default()
        }
    }

    #[test]
    fn full_pass_writes_all_files() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        let log = Arc::new(MemoryLog::new());
        let outcome = generator(root.path(), log.clone(), options())
            .start_conversion(&dir, &[], &tree(), &[]);

        assert_eq!(outcome, ConversionOutcome::Completed { plugin_files: vec![] });
        let header = fs::read_to_string(dir.join("demo_menu.h")).unwrap();
        assert!(header.contains("void CALLBACK_FUNCTION onStatus(int id);"));
        assert!(dir.join("demo_menu.cpp").is_file());
        let sketch = fs::read_to_string(dir.join("demo.ino")).unwrap();
        assert!(sketch.contains("void CALLBACK_FUNCTION onStatus(int id) {"));
        assert!(log.contains(" - Writing out header file"));
        // collaborator lines go through the same timestamped sink
        let stamped = |needle: &str| {
            log.lines()
                .iter()
                .any(|l| l.contains(needle) && l.contains(" - ") && l.as_bytes().get(8) == Some(&b':'))
        };
        assert!(stamped("Creating new entry point"));
        assert!(stamped("Checking if any plugins have been removed"));
    }

    #[test]
    fn second_pass_is_byte_identical() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        let log: Arc<dyn CoreLog> = Arc::new(MemoryLog::new());
        let g = generator(root.path(), log, options());
        let t = tree();

        assert!(g.start_conversion(&dir, &[], &t, &[]).is_success());
        let first: Vec<String> = ["demo_menu.h", "demo_menu.cpp", "demo.ino"]
            .iter()
            .map(|f| fs::read_to_string(dir.join(f)).unwrap())
            .collect();
        assert!(g.start_conversion(&dir, &[], &t, &[]).is_success());
        let second: Vec<String> = ["demo_menu.h", "demo_menu.cpp", "demo.ino"]
            .iter()
            .map(|f| fs::read_to_string(dir.join(f)).unwrap())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn legacy_files_warn_but_succeed() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("demo.h"), "// old").unwrap();
        let log = Arc::new(MemoryLog::new());
        let outcome = generator(root.path(), log.clone(), options())
            .start_conversion(&dir, &[], &tree(), &[]);
        assert!(outcome.is_success());
        assert!(log.contains("OLD FILES FOUND"));
    }

    #[test]
    fn save_to_src_and_cpp_main() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        let opts = GeneratorOptions {
            save_to_src: true,
            use_cpp_main: true,
            ..options()
        };
        let log: Arc<dyn CoreLog> = Arc::new(MemoryLog::new());
        assert!(generator(root.path(), log, opts)
            .start_conversion(&dir, &[], &tree(), &[])
            .is_success());
        assert!(dir.join("src").join("demo_menu.h").is_file());
        assert!(dir.join("demo_main.cpp").is_file());
        assert!(!dir.join("demo.ino").exists());
    }

    #[test]
    fn missing_plugin_file_fails_at_provisioning() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        let creator = CodeCreator {
            id: "lcd".into(),
            name: "LCD".into(),
            subsystem: SubSystem::Display,
            includes: vec![],
            variables: vec![],
            function_calls: vec![],
            required_files: vec![RequiredFile {
                file_name: "missing.h".into(),
                packaging: Packaging::WithPlugin,
                replacements: IndexMap::new(),
            }],
            properties: vec![],
            source_dir: Some(root.path().to_path_buf()),
        };
        let log = Arc::new(MemoryLog::new());
        let outcome = generator(root.path(), log.clone(), options())
            .with_log_location("/tmp/menu-codegen.log")
            .start_conversion(&dir, &[creator], &tree(), &[]);
        assert_eq!(
            outcome,
            ConversionOutcome::Failed { at: ConversionState::ProvisioningPlugins }
        );
        assert!(log.contains("ERROR during conversion"));
        assert!(log.contains("/tmp/menu-codegen.log"));
        // files written before the failure stay
        assert!(dir.join("demo_menu.h").is_file());
    }

    #[test]
    fn entry_point_depends_on_platform() {
        let root = tempfile::tempdir().unwrap();
        let log: Arc<dyn CoreLog> = Arc::new(MemoryLog::new());
        let mbed = GeneratorOptions {
            platform: crate::plugins::platform::EmbeddedPlatform::MbedRtos,
            ..options()
        };
        let g = generator(root.path(), log, mbed);
        assert_eq!(g.entry_point(Path::new("p"), "p"), Path::new("p").join("p_main.cpp"));
    }
}
