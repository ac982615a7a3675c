//! tw-incremental - Incremental build cache for utility-class CSS generation
//!
//! Keeps one warm compiler and scanner per style-sheet entry point, rebuilds
//! them only when a file they were built from changes, and merges candidates
//! found in the bundler's module graph into each entry's output.

pub mod cache;
pub mod candidates;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod instrumentation;
pub mod plugin;
pub mod scanner;
