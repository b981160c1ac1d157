//! Support files that features need in the project directory.
//!
//! Files left over from an earlier run with a different feature selection are
//! removed first, then every required file is copied in with its token
//! replacements applied.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::CoreLog;
use crate::arduino::library::LibraryInstaller;
use crate::generator::error::ConversionError;
use crate::plugins::creator::{CodeCreator, Packaging, RequiredFile, base_name};

/// Library that holds files packaged `WITH_LIBRARY`.
pub const RUNTIME_LIBRARY: &str = "tcMenu";

pub struct PluginProvisioner<'a> {
    logger: &'a Arc<dyn CoreLog>,
    installer: &'a dyn LibraryInstaller,
}

/// Previous files whose base name is not among the required base names.
pub fn stale_files(required: &[&RequiredFile], previous: &[String]) -> Vec<String> {
    let wanted: HashSet<String> = required.iter().map(|f| f.base_name()).collect();
    previous
        .iter()
        .map(|p| base_name(p))
        .filter(|b| !wanted.contains(b))
        .collect()
}

/// Apply each replacement in order; later ones see earlier results. Works on
/// raw bytes so files in any encoding are copied intact.
pub fn apply_replacements(data: &[u8], file: &RequiredFile) -> Vec<u8> {
    file.replacements
        .iter()
        .fold(data.to_vec(), |acc, (from, to)| {
            replace_bytes(&acc, from.as_bytes(), to.as_bytes())
        })
}

fn replace_bytes(data: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

impl<'a> PluginProvisioner<'a> {
    pub fn new(logger: &'a Arc<dyn CoreLog>, installer: &'a dyn LibraryInstaller) -> Self {
        Self { logger, installer }
    }

    /// Remove stale files, then copy every required file. Returns the names to
    /// remember for the next run. Stops at the first file that fails; files
    /// already written stay in place.
    pub fn provision(
        &self,
        creators: &[CodeCreator],
        previous: &[String],
        directory: &Path,
    ) -> Result<Vec<String>, ConversionError> {
        let required: Vec<&RequiredFile> =
            creators.iter().flat_map(|c| c.required_files.iter()).collect();

        self.logger
            .info("Checking if any plugins have been removed from the project and need removal");
        for stale in stale_files(&required, previous) {
            let target = directory.join(&stale);
            if !target.exists() {
                continue;
            }
            self.logger.info(&format!("Removing unused plugin: {}", target.display()));
            if let Err(e) = fs::remove_file(&target) {
                self.logger.warn(&format!(
                    "Could not delete plugin: {} error {e}",
                    target.display()
                ));
            }
        }

        self.logger
            .info("Finding any required rendering / remote plugins to add to project");
        for creator in creators {
            for file in &creator.required_files {
                self.copy_one(creator, file, directory)?;
            }
        }

        Ok(required.iter().map(|f| f.file_name.clone()).collect())
    }

    fn copy_one(
        &self,
        creator: &CodeCreator,
        file: &RequiredFile,
        directory: &Path,
    ) -> Result<(), ConversionError> {
        let fail = |reason: String| ConversionError::Provisioning {
            file: file.to_string(),
            reason,
        };

        let source = self.source_path(creator, file).map_err(&fail)?;
        let data = fs::read(&source)
            .map_err(|e| fail(format!("read {}: {e}", source.display())))?;
        let data = apply_replacements(&data, file);

        let target = directory.join(file.base_name());
        fs::write(&target, data).map_err(|e| fail(format!("write {}: {e}", target.display())))?;
        self.logger.info(&format!("Copied with replacement {file}"));
        Ok(())
    }

    fn source_path(&self, creator: &CodeCreator, file: &RequiredFile) -> Result<PathBuf, String> {
        match file.packaging {
            Packaging::WithPlugin => {
                let dir = creator
                    .source_dir
                    .as_ref()
                    .ok_or_else(|| format!("plugin {} has no bundled files", creator.id))?;
                let path = dir.join(&file.file_name);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(format!("unable to locate file in plugin: {}", path.display()))
                }
            }
            Packaging::WithLibrary => self
                .installer
                .find_library_install(RUNTIME_LIBRARY)
                .map(|lib| lib.join(&file.file_name))
                .ok_or_else(|| format!("{RUNTIME_LIBRARY} library is not installed")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arduino::library::ArduinoLibraryInstaller;
    use crate::core_log::MemoryLog;
    use crate::plugins::properties::SubSystem;
    use indexmap::IndexMap;

    fn required(name: &str) -> RequiredFile {
        RequiredFile {
            file_name: name.into(),
            packaging: Packaging::WithPlugin,
            replacements: IndexMap::new(),
        }
    }

    fn creator(dir: &Path, files: Vec<RequiredFile>) -> CodeCreator {
        CodeCreator {
            id: "disp".into(),
            name: "Display".into(),
            subsystem: SubSystem::Display,
            includes: vec![],
            variables: vec![],
            function_calls: vec![],
            required_files: files,
            properties: vec![],
            source_dir: Some(dir.to_path_buf()),
        }
    }

    #[test]
    fn removal_is_base_name_set_difference() {
        let b = required("src/b.h");
        let d = required("d.h");
        let previous = vec!["plugins/a.h".to_string(), "b.h".to_string(), "c.h".to_string()];
        assert_eq!(stale_files(&[&b, &d], &previous), vec!["a.h", "c.h"]);
    }

    #[test]
    fn replacements_apply_sequentially() {
        let mut f = required("x.h");
        f.replacements.insert("AAA".into(), "BBB".into());
        f.replacements.insert("BBB".into(), "CCC".into());
        assert_eq!(apply_replacements(b"AAA and BBB", &f), b"CCC and CCC");
    }

    #[test]
    fn non_utf8_files_are_copied_with_replacements() {
        let plugin_dir = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        let font: &[u8] = &[0xff, 0xfe, b'N', b'A', b'M', b'E', 0x80, 0x00];
        fs::write(plugin_dir.path().join("font.h"), font).unwrap();

        let mut f = required("font.h");
        f.replacements.insert("NAME".into(), "big".into());
        let creators = vec![creator(plugin_dir.path(), vec![f])];
        let log: Arc<dyn CoreLog> = Arc::new(MemoryLog::new());
        let inst = ArduinoLibraryInstaller::new(Some(plugin_dir.path().join("none")));
        PluginProvisioner::new(&log, &inst)
            .provision(&creators, &[], project.path())
            .unwrap();
        assert_eq!(
            fs::read(project.path().join("font.h")).unwrap(),
            vec![0xff, 0xfe, b'b', b'i', b'g', 0x80, 0x00]
        );
    }

    #[test]
    fn provisions_and_removes() {
        let plugin_dir = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        for n in ["b.h", "d.h"] {
            fs::write(plugin_dir.path().join(n), format!("// {n} NAME")).unwrap();
        }
        for n in ["a.h", "b.h", "c.h"] {
            fs::write(project.path().join(n), "old").unwrap();
        }

        let mut d = required("d.h");
        d.replacements.insert("NAME".into(), "lcd".into());
        let creators = vec![creator(plugin_dir.path(), vec![required("b.h"), d])];
        let previous: Vec<String> = ["a.h", "b.h", "c.h"].map(String::from).to_vec();

        let log: Arc<dyn CoreLog> = Arc::new(MemoryLog::new());
        let inst = ArduinoLibraryInstaller::new(Some(plugin_dir.path().join("none")));
        let done = PluginProvisioner::new(&log, &inst)
            .provision(&creators, &previous, project.path())
            .unwrap();

        assert_eq!(done, vec!["b.h", "d.h"]);
        assert!(!project.path().join("a.h").exists());
        assert!(!project.path().join("c.h").exists());
        assert_eq!(fs::read_to_string(project.path().join("d.h")).unwrap(), "// d.h lcd");
        assert_eq!(fs::read_to_string(project.path().join("b.h")).unwrap(), "// b.h NAME");
    }

    #[test]
    fn missing_bundled_file_is_fatal() {
        let plugin_dir = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        let creators = vec![creator(plugin_dir.path(), vec![required("gone.h")])];
        let log: Arc<dyn CoreLog> = Arc::new(MemoryLog::new());
        let inst = ArduinoLibraryInstaller::new(Some(plugin_dir.path().to_path_buf()));
        let err = PluginProvisioner::new(&log, &inst)
            .provision(&creators, &[], project.path())
            .unwrap_err();
        assert!(matches!(err, ConversionError::Provisioning { .. }));
    }

    #[test]
    fn library_files_come_from_install() {
        let libs = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        fs::create_dir_all(libs.path().join("tcMenu").join("extras")).unwrap();
        fs::write(libs.path().join("tcMenu").join("extras").join("theme.h"), "theme").unwrap();

        let mut f = required("extras/theme.h");
        f.packaging = Packaging::WithLibrary;
        let creators = vec![creator(libs.path(), vec![f])];
        let log: Arc<dyn CoreLog> = Arc::new(MemoryLog::new());
        let inst = ArduinoLibraryInstaller::new(Some(libs.path().to_path_buf()));
        PluginProvisioner::new(&log, &inst)
            .provision(&creators, &[], project.path())
            .unwrap();
        assert_eq!(fs::read_to_string(project.path().join("theme.h")).unwrap(), "theme");
    }
}
