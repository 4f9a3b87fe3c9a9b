use std::io::{self, Write};

use anyhow::Result;
use clap::Args;

use super::{open_repo, print_commit};

#[derive(Args)]
pub struct ShowArgs {
    /// Commit (or resolvable name) to show
    #[arg(default_value = "@")]
    oid: String,
}

pub fn run(args: &ShowArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid = repo.resolve_name(&args.oid)?;
    let (commit, diff_bytes) = repo.show(oid)?;
    print_commit(&oid, &commit, &[]);
    io::stdout().write_all(&diff_bytes)?;
    Ok(0)
}
