//! repo-map: build token-budgeted repository maps for LLM prompts

use anyhow::Result;

fn main() -> Result<()> {
    repo_map::cli::run()
}
