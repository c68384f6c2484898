//! Build command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use super::utils::ScanArgs;
use crate::context::{budget_for_model, ContextBuilder};

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Token budget for the whole map
    #[arg(short = 't', long, value_name = "TOKENS", conflicts_with = "model")]
    pub max_tokens: Option<usize>,

    /// Size the budget to 80% of this model's context window
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write the map to this file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: BuildArgs) -> Result<()> {
    let (root, config) = args.scan.resolve()?;

    let max_tokens = match (&args.max_tokens, &args.model) {
        (Some(tokens), _) => *tokens,
        (None, Some(model)) => budget_for_model(model),
        (None, None) => config.default_max_tokens,
    };
    tracing::debug!("building map of {} with a budget of {max_tokens}", root.display());

    let context = ContextBuilder::new(&root).with_config(config).assemble(max_tokens);
    let map = context.render();

    match &args.output {
        Some(path) => {
            fs::write(path, &map)
                .with_context(|| format!("Failed writing map to {}", path.display()))?;
            eprintln!(
                "Wrote {} of {} files ({} / {} tokens) to {}",
                context.files_emitted(),
                context.total_files,
                context.total_tokens,
                max_tokens,
                path.display()
            );
            if let Some(stop) = &context.stopped_at {
                eprintln!("Budget exhausted at {stop}");
            }
        }
        None => print!("{map}"),
    }
    Ok(())
}
