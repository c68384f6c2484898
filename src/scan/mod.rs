//! File discovery with git-index and gitignore support

pub mod collector;

pub use collector::{collect_files, CollectStats, CollectStrategy, FileCollector};
