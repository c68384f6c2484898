//! Shared helpers: bounded reads, token accounting, path handling, worker pools.

pub mod encoding;
pub mod paths;
pub mod pool;
pub mod tokens;

pub use encoding::{is_binary_file, read_file_safe, DEFAULT_SAMPLE_SIZE};
pub use paths::{normalize_lexically, normalize_path, relative_path};
pub use pool::{map_bounded, WorkerPool};
pub use tokens::{count_tokens, estimate_tokens, truncate_to_bytes, truncate_to_tokens};
