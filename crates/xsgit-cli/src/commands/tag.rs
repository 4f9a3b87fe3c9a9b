use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct TagArgs {
    /// Name of the tag to create
    name: String,
    /// Commit (or resolvable name) the tag points at
    #[arg(default_value = "@")]
    oid: String,
}

pub fn run(args: &TagArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid = repo.resolve_name(&args.oid)?;
    repo.tag(&args.name, oid)?;
    Ok(0)
}
