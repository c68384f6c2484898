//! File dependency graph over a dense index arena.
//!
//! Node `i` is `files[i]`. Edges point from the importing file to the
//! imported one; self edges and duplicates are never stored.

use super::imports::{file_imports, RawImport};
use super::resolve::ImportResolver;
use crate::domain::{ContextConfig, RepoFile};
use crate::utils::pool::map_bounded;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    out_edges: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    /// A graph with `n` nodes and no edges.
    pub fn with_nodes(n: usize) -> Self {
        Self { out_edges: vec![Vec::new(); n], in_degree: vec![0; n] }
    }

    /// Read every file's imports in parallel and link the ones that resolve.
    pub fn build(files: &[RepoFile], config: &ContextConfig) -> Self {
        let imports: Vec<Vec<RawImport>> =
            map_bounded(config.skeleton_workers, files, |file| {
                if !file.language.has_import_patterns() {
                    return Vec::new();
                }
                file_imports(file, config.max_parse_bytes).unwrap_or_else(|e| {
                    tracing::debug!("{}: imports skipped ({e})", file.relative_path);
                    Vec::new()
                })
            });
        Self::from_imports(files, &imports)
    }

    /// Link pre-extracted imports; `imports[i]` belongs to `files[i]`.
    pub fn from_imports(files: &[RepoFile], imports: &[Vec<RawImport>]) -> Self {
        let resolver = ImportResolver::new(files);
        let mut graph = Self::with_nodes(files.len());
        for (from, raw) in imports.iter().enumerate().take(files.len()) {
            for import in raw {
                for to in resolver.resolve(from, import) {
                    graph.add_edge(from, to);
                }
            }
        }
        tracing::debug!(
            "dependency graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Add `from -> to`; returns false for self, duplicate or out-of-range edges.
    pub fn add_edge(&mut self, from: usize, to: usize) -> bool {
        let n = self.node_count();
        if from == to || from >= n || to >= n || self.out_edges[from].contains(&to) {
            return false;
        }
        self.out_edges[from].push(to);
        self.in_degree[to] += 1;
        true
    }

    pub fn node_count(&self) -> usize {
        self.out_edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.out_edges.iter().map(Vec::len).sum()
    }

    pub fn out_edges(&self, node: usize) -> &[usize] {
        &self.out_edges[node]
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.in_degree[node]
    }
}
