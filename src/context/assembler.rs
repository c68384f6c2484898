//! Budgeted assembly of the repository map.

use super::render::{header, render_full, render_skeleton};
use crate::domain::{ContextConfig, Language, RepoFile};
use crate::graph::DependencyGraph;
use crate::rank::{rank_files, ranked_order};
use crate::scan::{CollectStats, FileCollector};
use crate::skeleton::query_table;
use crate::utils::pool::WorkerPool;
use crate::utils::tokens::{default_counter, TokenCounter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Skeletons rendered per round before the budget is checked again.
const SKELETON_BATCH_PER_WORKER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Header,
    File,
    Skeleton,
}

/// One emitted piece of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub path: Option<String>,
    pub text: String,
    pub tokens: usize,
}

/// The map as a list of segments, plus what was left out.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    pub segments: Vec<Segment>,
    pub total_tokens: usize,
    pub max_tokens: usize,
    pub total_files: usize,
    /// Essential files whose full block did not fit.
    pub skipped_essentials: Vec<String>,
    /// The file whose skeleton ended the second pass, if the budget did.
    pub stopped_at: Option<String>,
    pub collect_stats: CollectStats,
    /// Languages that got structural skeletons rather than the line fallback.
    pub structural_languages: Vec<Language>,
}

impl AssembledContext {
    pub fn render(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn files_emitted(&self) -> usize {
        self.segments.iter().filter(|s| s.kind != SegmentKind::Header).count()
    }

    fn push(&mut self, kind: SegmentKind, path: Option<String>, text: String, tokens: usize) {
        self.total_tokens += tokens;
        self.segments.push(Segment { kind, path, text, tokens });
    }

    /// Admit a block only if the running total stays strictly below the budget.
    fn fits(&self, tokens: usize) -> bool {
        self.total_tokens.saturating_add(tokens) < self.max_tokens
    }
}

/// Collected files with their graph and scores.
pub struct RankedRepo {
    pub files: Vec<RepoFile>,
    pub graph: DependencyGraph,
    /// Indexed like `files`.
    pub scores: Vec<f64>,
    /// Indices into `files`, highest score first.
    pub order: Vec<usize>,
    pub collect_stats: CollectStats,
}

/// Builds a ranked, token-budgeted map of a repository.
///
/// ```no_run
/// use repo_map::context::ContextBuilder;
///
/// let map = ContextBuilder::new("path/to/repo").build(32_000);
/// println!("{map}");
/// ```
pub struct ContextBuilder {
    root: PathBuf,
    config: ContextConfig,
    counter: Option<TokenCounter>,
}

impl ContextBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf(), config: ContextConfig::default(), counter: None }
    }

    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Count tokens with `counter` instead of the shared default.
    pub fn with_counter(mut self, counter: TokenCounter) -> Self {
        self.counter = Some(counter);
        self
    }

    fn counter(&self) -> &TokenCounter {
        self.counter.as_ref().unwrap_or_else(|| default_counter())
    }

    /// The map as a single string.
    pub fn build(&self, max_tokens: usize) -> String {
        self.assemble(max_tokens).render()
    }

    /// Collect, link and score the repository's files.
    pub fn rank(&self) -> RankedRepo {
        let mut collector = FileCollector::new(self.root.clone(), &self.config);
        let files = collector.collect();
        let graph = DependencyGraph::build(&files, &self.config);
        let scores = rank_files(&files, &graph);
        let order = ranked_order(&files, &scores);
        RankedRepo { files, graph, scores, order, collect_stats: collector.stats().clone() }
    }

    pub fn assemble(&self, max_tokens: usize) -> AssembledContext {
        let RankedRepo { files, scores, order, collect_stats, .. } = self.rank();
        let counter = self.counter();
        let config = &self.config;

        // Compile the query table before any pool worker reads it.
        let structural_languages = query_table().available();

        let mut out = AssembledContext {
            max_tokens,
            total_files: files.len(),
            collect_stats,
            structural_languages,
            ..AssembledContext::default()
        };
        tracing::info!(
            "token budget {max_tokens}, {} files, {} token counts",
            files.len(),
            if counter.is_exact() { "exact" } else { "estimated" }
        );

        let head = header(&self.dir_name(), files.len());
        let head_tokens = counter.count(&head);
        if !out.fits(head_tokens) {
            tracing::warn!("header alone ({head_tokens} tokens) exceeds the budget of {max_tokens}");
        }
        out.push(SegmentKind::Header, None, head, head_tokens);

        // Pass 1: essential files in full. A block that does not fit is skipped.
        let essentials: Vec<usize> =
            order.iter().copied().filter(|&i| config.is_essential(&files[i])).collect();
        let pool = WorkerPool::new(config.essentials_workers);
        let blocks = pool.map(&essentials, |&i| render_full(&files[i], scores[i], config));

        let mut processed: HashSet<usize> = HashSet::new();
        for (&i, block) in essentials.iter().zip(blocks) {
            if block.is_empty() {
                continue;
            }
            let tokens = counter.count(&block);
            let rel = files[i].relative_path.clone();
            if out.fits(tokens) {
                out.push(SegmentKind::File, Some(rel), block, tokens);
                processed.insert(i);
            } else {
                tracing::debug!("{rel}: full block ({tokens} tokens) does not fit, skipped");
                out.skipped_essentials.push(rel);
            }
        }

        // Pass 2: skeletons in rank order until the first block that does not fit.
        let rest: Vec<usize> = order.into_iter().filter(|i| !processed.contains(i)).collect();
        let pool = WorkerPool::new(config.skeleton_workers);
        let batch = config.skeleton_workers.max(1) * SKELETON_BATCH_PER_WORKER;
        'batches: for chunk in rest.chunks(batch) {
            let blocks = pool.map(chunk, |&i| render_skeleton(&files[i], scores[i], config));
            for (&i, block) in chunk.iter().zip(blocks) {
                if block.is_empty() {
                    continue;
                }
                let tokens = counter.count(&block);
                let rel = files[i].relative_path.clone();
                if !out.fits(tokens) {
                    tracing::debug!("{rel}: skeleton ({tokens} tokens) exhausts the budget, stopping");
                    out.stopped_at = Some(rel);
                    break 'batches;
                }
                out.push(SegmentKind::Skeleton, Some(rel), block, tokens);
            }
        }

        tracing::info!(
            "map uses {} of {max_tokens} tokens across {} files",
            out.total_tokens,
            out.files_emitted()
        );
        out
    }

    /// Base name of the root, resolving `.` and friends.
    fn dir_name(&self) -> String {
        let resolved = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| resolved.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn heuristic_builder(root: &Path) -> ContextBuilder {
        ContextBuilder::new(root).with_counter(TokenCounter::heuristic())
    }

    #[test]
    fn header_counts_against_the_budget() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.py"), "def a():\n    pass\n").unwrap();

        let ctx = heuristic_builder(tmp.path()).assemble(100_000);
        assert_eq!(ctx.segments[0].kind, SegmentKind::Header);
        assert_eq!(ctx.total_tokens, ctx.segments.iter().map(|s| s.tokens).sum::<usize>());
        assert!(ctx.total_tokens < 100_000);
    }

    #[test]
    fn oversized_essential_is_skipped_but_pass_continues() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("README.md"), "word ".repeat(2_000)).unwrap();
        fs::write(tmp.path().join("go.mod"), "module demo\n").unwrap();

        let ctx = heuristic_builder(tmp.path()).assemble(300);
        assert_eq!(ctx.skipped_essentials, vec!["README.md".to_string()]);
        let paths: Vec<_> = ctx.segments.iter().filter_map(|s| s.path.as_deref()).collect();
        assert!(paths.contains(&"go.mod"));
        assert!(ctx.total_tokens < 300);
    }

    #[test]
    fn query_table_is_ready_before_rendering() {
        let tmp = TempDir::new().unwrap();
        let ctx = heuristic_builder(tmp.path()).assemble(1_000);
        assert_eq!(ctx.structural_languages, crate::skeleton::STRUCTURAL_LANGUAGES.to_vec());
        assert_eq!(ctx.segments.len(), 1);
    }

    #[test]
    fn dir_name_resolves_current_dir() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("project");
        fs::create_dir(&nested).unwrap();
        let builder = ContextBuilder::new(nested.join("."));
        assert_eq!(builder.dir_name(), "project");
    }
}
