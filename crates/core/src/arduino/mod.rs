//! Board side collaborators: the sketch entry point and installed libraries.
pub mod library;
pub mod sketch;
