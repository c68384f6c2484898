//! Rank command implementation

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::utils::ScanArgs;
use crate::graph::DependencyGraph;
use crate::rank::{ranked_files, RankedFile};
use crate::scan::FileCollector;

#[derive(Args)]
pub struct RankArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Show only the N highest-ranked files
    #[arg(short = 'n', long, value_name = "N")]
    pub top: Option<usize>,

    /// Print the ranking as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct RankReport {
    repository: String,
    strategy: &'static str,
    total_files: usize,
    edges: usize,
    files: Vec<RankedFile>,
}

pub fn run(args: RankArgs) -> Result<()> {
    let (root, config) = args.scan.resolve()?;

    let mut collector = FileCollector::new(root.clone(), &config);
    let files = collector.collect();
    let graph = DependencyGraph::build(&files, &config);

    let mut ranked = ranked_files(&files, &graph);
    if let Some(top) = args.top {
        ranked.truncate(top);
    }

    let report = RankReport {
        repository: root.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string(),
        strategy: collector.stats().strategy.as_str(),
        total_files: files.len(),
        edges: graph.edge_count(),
        files: ranked,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Repository: {}", report.repository);
    println!("Files: {} (via {}), import edges: {}", report.total_files, report.strategy, report.edges);
    for (pos, file) in report.files.iter().enumerate() {
        println!(
            "{:>4}. {:.4}  in:{:<3} out:{:<3} {}",
            pos + 1,
            file.score,
            file.in_degree,
            file.out_degree,
            file.path
        );
    }
    Ok(())
}
