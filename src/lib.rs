//! repo-map: compact, token-budgeted repository maps for LLM prompts
//!
//! A build collects the repository's files, ranks them by how central they
//! are in the import graph, then emits essential files in full followed by
//! per-file definition skeletons until the token budget runs out.
//!
//! ```no_run
//! let map = repo_map::build_repository_context(std::path::Path::new("."), 8_000);
//! print!("{map}");
//! ```

use std::path::Path;

pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod graph;
pub mod rank;
pub mod scan;
pub mod skeleton;
pub mod utils;

pub use context::{AssembledContext, ContextBuilder};
pub use domain::{ContextConfig, Language, RepoFile};

/// Build the map of `root` within `max_tokens`, using default settings.
///
/// Never fails: the worst case is the header with no file entries.
pub fn build_repository_context(root: &Path, max_tokens: usize) -> String {
    ContextBuilder::new(root).build(max_tokens)
}
