//! Context assembly: essentials in full, then skeletons, within a token budget.

pub mod assembler;
pub mod budget;
pub mod render;

pub use assembler::{AssembledContext, ContextBuilder, RankedRepo, Segment, SegmentKind};
pub use budget::{budget_for_model, max_tokens_for_model, DEFAULT_MAX_TOKENS};
