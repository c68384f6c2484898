//! Import graph: extraction, resolution and the dependency arena.

pub mod dependency;
pub mod imports;
pub mod resolve;

pub use dependency::DependencyGraph;
pub use imports::{extract_imports, file_imports, RawImport};
pub use resolve::ImportResolver;
