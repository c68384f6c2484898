//! Structural skeletons: the definitions of a file reduced to one line each.
//!
//! Languages with a compiled query get a `<kind> <name>` listing; everything
//! else, and anything that fails to parse, gets its first lines verbatim.

pub mod extractor;
pub mod queries;

pub use extractor::{
    doc_preview, extract_skeleton, fallback_lines, first_lines, parse_skeleton,
    skeleton_or_fallback,
};
pub use queries::{query_table, QueryTable, STRUCTURAL_LANGUAGES};
