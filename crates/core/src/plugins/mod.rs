//! Feature plugins, their properties, and the target boards.
pub mod creator;
pub mod platform;
pub mod properties;
