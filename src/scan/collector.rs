//! File collection: git-tracked files first, ignore-aware walk as fallback.

use crate::domain::{ContextConfig, RepoFile};
use crate::error::CollectError;
use crate::utils::{is_binary_file, normalize_path, relative_path, DEFAULT_SAMPLE_SIZE};
use git2::Repository;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Which enumeration produced the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectStrategy {
    GitIndex,
    #[default]
    Walk,
}

impl CollectStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectStrategy::GitIndex => "git-index",
            CollectStrategy::Walk => "walk",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectStats {
    pub strategy: CollectStrategy,
    pub files_seen: usize,
    pub files_included: usize,
    pub skipped_extension: usize,
    pub skipped_name: usize,
    pub skipped_glob: usize,
    pub skipped_binary: usize,
    pub total_bytes: u64,
}

/// Enumerates the files of a repository that are worth describing.
pub struct FileCollector {
    root: PathBuf,
    ignored_dirs: HashSet<String>,
    ignored_extensions: HashSet<String>,
    ignored_files: HashSet<String>,
    exclude_globs: Vec<String>,
    respect_gitignore: bool,
    use_git_index: bool,
    skip_binary: bool,
    stats: CollectStats,
}

enum Skip {
    Extension,
    Name,
    Glob,
    Binary,
}

impl FileCollector {
    pub fn new(root: PathBuf, config: &ContextConfig) -> Self {
        Self {
            root,
            ignored_dirs: config.ignored_dirs.iter().cloned().collect(),
            ignored_extensions: config.ignored_extensions.iter().cloned().collect(),
            ignored_files: config.ignored_files.iter().cloned().collect(),
            exclude_globs: config.exclude_globs.clone(),
            respect_gitignore: config.respect_gitignore,
            use_git_index: config.use_git_index,
            skip_binary: config.skip_binary,
            stats: CollectStats::default(),
        }
    }

    /// Set whether tracked files from the git index are preferred
    pub fn use_git_index(mut self, enabled: bool) -> Self {
        self.use_git_index = enabled;
        self
    }

    /// Set whether the walk honours .gitignore files
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    pub fn stats(&self) -> &CollectStats {
        &self.stats
    }

    /// Collect files sorted by relative path.
    ///
    /// Never fails: a git error falls back to the walk, and an unreadable
    /// root yields an empty list.
    pub fn collect(&mut self) -> Vec<RepoFile> {
        self.stats = CollectStats::default();

        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        if !root.is_dir() {
            tracing::warn!("scan root is not a readable directory: {}", root.display());
            return Vec::new();
        }

        let candidates = if self.use_git_index {
            match self.tracked_files(&root) {
                Ok(tracked) => {
                    self.stats.strategy = CollectStrategy::GitIndex;
                    tracked
                }
                Err(e) => {
                    tracing::debug!("git index unavailable for {}: {e}; walking", root.display());
                    self.walk_files(&root)
                }
            }
        } else {
            self.walk_files(&root)
        };

        let globs = match self.build_exclude_globset() {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("{e}; exclude globs ignored");
                GlobSet::empty()
            }
        };

        let mut files = Vec::with_capacity(candidates.len());
        for (path, rel) in candidates {
            self.stats.files_seen += 1;
            match self.check(&path, &rel, &globs) {
                Some(Skip::Extension) => self.stats.skipped_extension += 1,
                Some(Skip::Name) => self.stats.skipped_name += 1,
                Some(Skip::Glob) => self.stats.skipped_glob += 1,
                Some(Skip::Binary) => self.stats.skipped_binary += 1,
                None => {
                    let Ok(metadata) = path.metadata() else {
                        continue;
                    };
                    self.stats.files_included += 1;
                    self.stats.total_bytes += metadata.len();
                    files.push(RepoFile::new(path, rel, metadata.len()));
                }
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        files.dedup_by(|a, b| a.relative_path == b.relative_path);
        tracing::debug!(
            "collected {} of {} files via {}",
            files.len(),
            self.stats.files_seen,
            self.stats.strategy.as_str()
        );
        files
    }

    fn build_exclude_globset(&self) -> Result<GlobSet, CollectError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_globs {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }

    fn check(&self, path: &Path, rel: &str, globs: &GlobSet) -> Option<Skip> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_lowercase();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if self.ignored_extensions.contains(&format!(".{}", ext.to_lowercase())) {
                return Some(Skip::Extension);
            }
        }
        if self.ignored_files.contains(&name) {
            return Some(Skip::Name);
        }
        if globs.is_match(rel) {
            return Some(Skip::Glob);
        }
        if self.skip_binary && is_binary_file(path, DEFAULT_SAMPLE_SIZE) {
            return Some(Skip::Binary);
        }
        None
    }

    /// Files tracked in the git index under `root`.
    fn tracked_files(&self, root: &Path) -> Result<Vec<(PathBuf, String)>, CollectError> {
        let repo = Repository::discover(root)?;
        let workdir = repo.workdir().ok_or(CollectError::BareRepository)?;
        let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
        let prefix = root.strip_prefix(&workdir).map_err(|_| CollectError::OutsideWorkTree {
            root: root.to_path_buf(),
            workdir: workdir.clone(),
        })?;

        let index = repo.index()?;
        let mut files = Vec::new();
        for entry in index.iter() {
            let Ok(repo_rel) = std::str::from_utf8(&entry.path) else {
                continue;
            };
            let Ok(rel) = Path::new(repo_rel).strip_prefix(prefix) else {
                continue;
            };
            if self.in_ignored_dir(rel) {
                continue;
            }
            let path = root.join(rel);
            // Deleted files and submodule gitlinks are not regular files.
            if !path.is_file() {
                continue;
            }
            let Some(rel) = rel.to_str() else {
                continue;
            };
            files.push((path, normalize_path(rel)));
        }

        if files.is_empty() {
            return Err(CollectError::NoTrackedFiles(root.to_path_buf()));
        }
        Ok(files)
    }

    /// Whether any parent directory of `rel` is denylisted.
    fn in_ignored_dir(&self, rel: &Path) -> bool {
        rel.parent().is_some_and(|dir| {
            dir.components().any(|c| {
                c.as_os_str().to_str().is_some_and(|name| self.ignored_dirs.contains(name))
            })
        })
    }

    /// Recursive walk pruning denylisted directory names.
    fn walk_files(&self, root: &Path) -> Vec<(PathBuf, String)> {
        let ignored_dirs = self.ignored_dirs.clone();
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .parents(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                if !is_dir {
                    return true;
                }
                let name = entry.file_name().to_str().unwrap_or("");
                !ignored_dirs.contains(name)
            });

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("walk error under {}: {e}", root.display());
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.into_path();
            if let Some(rel) = relative_path(root, &path) {
                files.push((path, rel));
            }
        }
        files
    }
}

/// Collect with default settings.
pub fn collect_files(root: &Path, config: &ContextConfig) -> Vec<RepoFile> {
    FileCollector::new(root.to_path_buf(), config).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rel_paths(files: &[RepoFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn walk_prunes_denylisted_dirs_and_extensions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for noise_dir in &["node_modules", "__pycache__", "dist", ".git"] {
            fs::create_dir_all(root.join(noise_dir)).unwrap();
            fs::write(root.join(noise_dir).join("file.py"), "# noise").unwrap();
        }
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/app.py"), "print('hi')").unwrap();
        fs::write(root.join("logo.png"), "not really a png").unwrap();
        fs::write(root.join("yarn.lock"), "lock").unwrap();
        fs::write(root.join("README.md"), "# Demo").unwrap();

        let mut collector =
            FileCollector::new(root.to_path_buf(), &ContextConfig::default()).use_git_index(false);
        let files = collector.collect();

        assert_eq!(rel_paths(&files), vec!["README.md", "src/app.py"]);
        assert_eq!(collector.stats().strategy, CollectStrategy::Walk);
        assert_eq!(collector.stats().skipped_extension, 2);
    }

    #[test]
    fn walk_honours_gitignore_outside_a_repository() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".gitignore"), "secret.py\n").unwrap();
        fs::write(root.join("secret.py"), "x = 1").unwrap();
        fs::write(root.join("main.py"), "x = 2").unwrap();

        let files = FileCollector::new(root.to_path_buf(), &ContextConfig::default())
            .use_git_index(false)
            .collect();
        let paths = rel_paths(&files);
        assert!(paths.contains(&"main.py"));
        assert!(!paths.contains(&"secret.py"));
    }

    #[test]
    fn walk_can_ignore_gitignore() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".gitignore"), "secret.py\n").unwrap();
        fs::write(root.join("secret.py"), "x = 1").unwrap();

        let files = FileCollector::new(root.to_path_buf(), &ContextConfig::default())
            .use_git_index(false)
            .respect_gitignore(false)
            .collect();
        assert!(rel_paths(&files).contains(&"secret.py"));
    }

    #[test]
    fn binary_content_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("blob.dat"), [0u8, 1, 2, 3, 0, 0]).unwrap();
        fs::write(root.join("ok.txt"), "plain").unwrap();

        let files = collect_files(root, &ContextConfig::default());
        assert_eq!(rel_paths(&files), vec!["ok.txt"]);
    }

    #[test]
    fn exclude_globs_apply() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/guide.md"), "guide").unwrap();
        fs::write(root.join("main.go"), "package main").unwrap();

        let config =
            ContextConfig { exclude_globs: vec!["docs/**".to_string()], ..Default::default() };
        let files = collect_files(root, &config);
        assert_eq!(rel_paths(&files), vec!["main.go"]);
    }

    #[test]
    fn git_index_lists_only_tracked_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let repo = Repository::init(root).unwrap();

        fs::write(root.join("tracked.py"), "a = 1").unwrap();
        fs::write(root.join("untracked.py"), "b = 2").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("tracked.py")).unwrap();
        index.write().unwrap();

        let mut collector = FileCollector::new(root.to_path_buf(), &ContextConfig::default());
        let files = collector.collect();
        assert_eq!(rel_paths(&files), vec!["tracked.py"]);
        assert_eq!(collector.stats().strategy, CollectStrategy::GitIndex);
    }

    #[test]
    fn tracked_files_in_denylisted_dirs_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let repo = Repository::init(root).unwrap();

        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join("dist/bundle.js"), "var a;").unwrap();
        fs::write(root.join("index.js"), "var b;").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("dist/bundle.js")).unwrap();
        index.add_path(Path::new("index.js")).unwrap();
        index.write().unwrap();

        let files = collect_files(root, &ContextConfig::default());
        assert_eq!(rel_paths(&files), vec!["index.js"]);
    }

    #[test]
    fn empty_git_index_falls_back_to_walk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        Repository::init(root).unwrap();
        fs::write(root.join("a.py"), "a = 1").unwrap();

        let mut collector = FileCollector::new(root.to_path_buf(), &ContextConfig::default());
        let files = collector.collect();
        assert_eq!(rel_paths(&files), vec!["a.py"]);
        assert_eq!(collector.stats().strategy, CollectStrategy::Walk);
    }

    #[test]
    fn missing_root_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let files = collect_files(&temp_dir.path().join("nope"), &ContextConfig::default());
        assert!(files.is_empty());
    }
}
