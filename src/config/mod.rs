//! Configuration loading
//!
//! Settings come from an optional `repo-map.toml`/`.yml` file at the
//! repository root; CLI flags override individual fields afterwards.

pub mod loader;

pub use loader::{load_config, CONFIG_CANDIDATES};
