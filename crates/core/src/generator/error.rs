use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a conversion pass. Advisory conditions are only logged.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Writing the generated header or source failed
    #[error("generation of {} failed: {source}", file.display())]
    Generation {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The entry point file could not be adjusted
    #[error("could not modify {}: {source}", file.display())]
    Patch {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A support file could not be resolved or copied
    #[error("unexpected problem processing {file}: {reason}")]
    Provisioning { file: String, reason: String },
}
