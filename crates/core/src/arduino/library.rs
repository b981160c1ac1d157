//! Where the embedded support libraries live and whether they are current.

use directories::UserDirs;
use once_cell::sync::Lazy;
use semver::Version;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Minimum versions the generated code is written against.
pub static REQUIRED_LIBRARIES: Lazy<Vec<(&'static str, Version)>> = Lazy::new(|| {
    vec![
        ("tcMenu", Version::new(1, 4, 0)),
        ("IoAbstraction", Version::new(1, 4, 0)),
        ("LiquidCrystalIO", Version::new(1, 1, 0)),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryVersion {
    pub name: String,
    pub installed: Option<Version>,
    pub required: Version,
}

impl LibraryVersion {
    pub fn is_up_to_date(&self) -> bool {
        self.installed.as_ref().is_some_and(|v| *v >= self.required)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryStatus {
    pub libraries: Vec<LibraryVersion>,
}

impl LibraryStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.libraries.iter().all(LibraryVersion::is_up_to_date)
    }

    pub fn stale(&self) -> impl Iterator<Item = &LibraryVersion> {
        self.libraries.iter().filter(|l| !l.is_up_to_date())
    }
}

/// Version status and install lookup for support libraries.
pub trait LibraryInstaller: Send + Sync {
    fn status_of_all_libraries(&self) -> LibraryStatus;
    fn find_library_install(&self, name: &str) -> Option<PathBuf>;
}

/// Looks in the Arduino sketchbook `libraries` folder.
pub struct ArduinoLibraryInstaller {
    library_dir: Option<PathBuf>,
}

impl ArduinoLibraryInstaller {
    /// Use `library_dir`, or the default sketchbook location when `None`.
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.or_else(Self::default_library_dir),
        }
    }

    /// `<Documents>/Arduino/libraries`
    pub fn default_library_dir() -> Option<PathBuf> {
        let dirs = UserDirs::new()?;
        let docs = dirs.document_dir()?;
        Some(docs.join("Arduino").join("libraries"))
    }

    pub fn library_dir(&self) -> Option<&Path> {
        self.library_dir.as_deref()
    }

    /// `version=` from the library's `library.properties`.
    pub fn installed_version(&self, name: &str) -> Option<Version> {
        let props = self.find_library_install(name)?.join("library.properties");
        let content = fs::read_to_string(props).ok()?;
        content
            .lines()
            .filter_map(|l| l.trim().strip_prefix("version="))
            .find_map(parse_lenient)
    }
}

impl LibraryInstaller for ArduinoLibraryInstaller {
    fn status_of_all_libraries(&self) -> LibraryStatus {
        LibraryStatus {
            libraries: REQUIRED_LIBRARIES
                .iter()
                .map(|(name, required)| LibraryVersion {
                    name: name.to_string(),
                    installed: self.installed_version(name),
                    required: required.clone(),
                })
                .collect(),
        }
    }

    fn find_library_install(&self, name: &str) -> Option<PathBuf> {
        let dir = self.library_dir.as_ref()?.join(name);
        if dir.is_dir() { Some(dir) } else { None }
    }
}

/// Accepts `1.4`, `1.4.2` and `v1.4.2`; missing parts count as zero.
pub fn parse_lenient(text: &str) -> Option<Version> {
    let t = text.trim().trim_start_matches('v');
    if let Ok(v) = Version::parse(t) {
        return Some(v);
    }
    let mut parts = t.split('.').map(|p| p.parse::<u64>());
    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    Some(Version::new(major, minor, patch))
}
