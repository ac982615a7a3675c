//! Build dependency tracking
//!
//! A compiled style sheet is only reused while every file it was built
//! from keeps the modification time recorded when it was compiled.

mod tracker;

pub use tracker::{DependencyTracker, Mtime};
