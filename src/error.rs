//! Error types for each stage of a build.
//!
//! None of these escape [`crate::build_repository_context`]: the assembler
//! maps every variant to its degraded value (walk fallback, line fallback,
//! no imports, uniform ranks, heuristic token count).

use crate::domain::Language;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("git repository unavailable: {0}")]
    Git(#[from] git2::Error),

    #[error("repository has no work tree (bare)")]
    BareRepository,

    #[error("scan root {root} is outside the work tree {workdir}")]
    OutsideWorkTree { root: PathBuf, workdir: PathBuf },

    #[error("git index lists no files under {0}")]
    NoTrackedFiles(PathBuf),

    #[error("invalid exclude glob: {0}")]
    Glob(#[from] globset::Error),
}

#[derive(Debug, Error)]
pub enum SkeletonError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no structural grammar for language '{0}'")]
    Unsupported(Language),

    #[error("structural query for '{0}' is unavailable")]
    QueryUnavailable(Language),

    #[error("{0} source did not parse cleanly")]
    Parse(Language),

    #[error("no definitions found")]
    NoDefinitions,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no import patterns for language '{0}'")]
    Unsupported(Language),
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("dependency graph is empty")]
    EmptyGraph,

    #[error("pagerank produced a non-finite score after {iterations} iterations")]
    NonFinite { iterations: usize },
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("exact tokenizer is unavailable")]
    EncoderUnavailable,

    #[error("token prefix could not be decoded: {0}")]
    Decode(String),
}
