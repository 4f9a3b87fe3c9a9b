use anyhow::Result;
use clap::Args;

use super::{open_repo, print_commit};

#[derive(Args)]
pub struct LogArgs {
    /// Commit (or resolvable name) to start from
    #[arg(default_value = "@")]
    oid: String,
}

pub fn run(args: &LogArgs) -> Result<i32> {
    let repo = open_repo()?;
    let start = repo.resolve_name(&args.oid)?;
    for entry in repo.log(start)? {
        print_commit(&entry.oid, &entry.commit, &entry.refs);
    }
    Ok(0)
}
