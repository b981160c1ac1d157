//! Turns a menu tree into the generated header, source and support files.
pub mod callbacks;
pub mod emitter;
pub mod error;
pub mod extractor;
pub mod format;
pub mod linearize;
pub mod naming;
pub mod orchestrator;
pub mod provision;
pub mod structure;
