//! Incremental build state: roots and the registry that owns them

pub mod ids;
mod registry;
mod root;
pub mod session;

pub use registry::{RootHandle, RootRegistry};
pub use root::{Generated, Root};
