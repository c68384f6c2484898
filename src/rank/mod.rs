//! File ranking by dependency centrality.
//!
//! Scores come from PageRank over the import graph: a file imported by many
//! others (directly or transitively) scores above a leaf. When ranking fails
//! every file gets the same score and path order decides.

use crate::domain::RepoFile;
use crate::error::RankError;
use crate::graph::DependencyGraph;
use serde::Serialize;
use std::cmp::Ordering;

/// Score assigned to every file when PageRank cannot be computed.
pub const FALLBACK_SCORE: f64 = 1.0;

/// Power-iteration PageRank.
#[derive(Debug, Clone, Copy)]
pub struct PageRank {
    damping_factor: f64,
    max_iterations: usize,
    convergence_threshold: f64,
}

impl Default for PageRank {
    fn default() -> Self {
        Self { damping_factor: 0.85, max_iterations: 100, convergence_threshold: 1e-10 }
    }
}

impl PageRank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn damping_factor(mut self, damping: f64) -> Self {
        self.damping_factor = damping;
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Scores indexed like the graph's nodes; they sum to 1.
    pub fn compute(&self, graph: &DependencyGraph) -> Result<Vec<f64>, RankError> {
        let n = graph.node_count();
        if n == 0 {
            return Err(RankError::EmptyGraph);
        }
        let nf = n as f64;
        let d = self.damping_factor;
        let mut rank = vec![1.0 / nf; n];
        let mut next = vec![0.0; n];

        for iteration in 1..=self.max_iterations {
            let mut dangling = 0.0;
            next.iter_mut().for_each(|v| *v = 0.0);
            for (node, &score) in rank.iter().enumerate() {
                let targets = graph.out_edges(node);
                if targets.is_empty() {
                    dangling += score;
                } else {
                    let share = score / targets.len() as f64;
                    for &t in targets {
                        next[t] += share;
                    }
                }
            }

            // Dangling mass is spread over every node.
            let base = (1.0 - d) / nf + d * dangling / nf;
            let mut delta = 0.0;
            for (new, old) in next.iter_mut().zip(&rank) {
                *new = base + d * *new;
                delta += (*new - old).abs();
            }
            if next.iter().any(|v| !v.is_finite()) {
                return Err(RankError::NonFinite { iterations: iteration });
            }
            std::mem::swap(&mut rank, &mut next);
            if delta < self.convergence_threshold {
                tracing::trace!("pagerank converged after {iteration} iterations");
                break;
            }
        }
        Ok(rank)
    }
}

/// Score every file, falling back to uniform scores when ranking fails.
pub fn rank_files(files: &[RepoFile], graph: &DependencyGraph) -> Vec<f64> {
    if graph.node_count() != files.len() {
        tracing::warn!(
            "rank fallback: graph has {} nodes for {} files",
            graph.node_count(),
            files.len()
        );
        return vec![FALLBACK_SCORE; files.len()];
    }
    match PageRank::new().compute(graph) {
        Ok(scores) => scores,
        Err(RankError::EmptyGraph) if files.is_empty() => Vec::new(),
        Err(e) => {
            tracing::warn!("rank fallback, using uniform scores: {e}");
            vec![FALLBACK_SCORE; files.len()]
        }
    }
}

/// File indices by score descending, ties by relative path ascending.
pub fn ranked_order(files: &[RepoFile], scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..files.len()).collect();
    order.sort_by(|&a, &b| {
        let sa = scores.get(a).copied().unwrap_or(0.0);
        let sb = scores.get(b).copied().unwrap_or(0.0);
        match sb.total_cmp(&sa) {
            Ordering::Equal => files[a].relative_path.cmp(&files[b].relative_path),
            other => other,
        }
    });
    order
}

/// A file with its rank, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFile {
    pub path: String,
    pub language: crate::domain::Language,
    pub score: f64,
    pub in_degree: usize,
    pub out_degree: usize,
}

/// Ranked report of `files`, highest score first.
pub fn ranked_files(files: &[RepoFile], graph: &DependencyGraph) -> Vec<RankedFile> {
    let scores = rank_files(files, graph);
    let with_degrees = graph.node_count() == files.len();
    ranked_order(files, &scores)
        .into_iter()
        .map(|i| RankedFile {
            path: files[i].relative_path.clone(),
            language: files[i].language,
            score: scores[i],
            in_degree: if with_degrees { graph.in_degree(i) } else { 0 },
            out_degree: if with_degrees { graph.out_edges(i).len() } else { 0 },
        })
        .collect()
}
