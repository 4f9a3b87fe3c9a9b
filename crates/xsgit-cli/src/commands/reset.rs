use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct ResetArgs {
    /// Commit (or resolvable name) to move HEAD to
    commit: String,
}

pub fn run(args: &ResetArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid = repo.resolve_name(&args.commit)?;
    repo.reset(oid)?;
    Ok(0)
}
