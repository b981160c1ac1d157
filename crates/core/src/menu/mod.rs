//! Menu tree model consumed read-only by the generator.
pub mod item;
pub mod project;
pub mod tree;
