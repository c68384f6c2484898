//! Shared CLI utilities.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::load_config;
use crate::domain::ContextConfig;

/// Options common to every subcommand that scans a repository.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Local repository directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Config file (default: repo-map.toml/.yml at the repository root)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Walk the directory instead of reading the git index
    #[arg(long)]
    pub no_git: bool,

    /// Ignore .gitignore rules during the walk
    #[arg(long)]
    pub no_gitignore: bool,
}

impl ScanArgs {
    /// Canonical root plus the file config with flag overrides applied.
    pub fn resolve(&self) -> Result<(PathBuf, ContextConfig)> {
        let root = self
            .path
            .canonicalize()
            .with_context(|| format!("Path does not exist: {}", self.path.display()))?;
        if !root.is_dir() {
            anyhow::bail!("Path is not a directory: {}", root.display());
        }

        let mut config = load_config(&root, self.config.as_deref())?;
        if self.no_git {
            config.use_git_index = false;
        }
        if self.no_gitignore {
            config.respect_gitignore = false;
        }
        if let Some(globs) = parse_csv(&self.exclude_glob) {
            config.exclude_globs.extend(globs);
        }
        Ok((root, config))
    }
}

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}
