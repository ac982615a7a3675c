//! Candidates discovered outside a root's own scanner
//!
//! The host runs every file it processes through an out-of-band scan. Those
//! results land in an [`ExternalScanStore`]; each root reads them through the
//! session-wide [`SharedCandidateIndex`] and keeps only the entries that fall
//! inside its own source scope.

mod index;
mod scope;
mod store;

pub use index::{SharedCandidateIndex, SharedCandidates};
pub use scope::{module_graph_candidates, should_include_candidates_from};
pub use store::{ExternalScanStore, ModuleGraphStore, ScannedModule};
