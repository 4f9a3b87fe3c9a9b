use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct MergeBaseArgs {
    commit1: String,
    commit2: String,
}

pub fn run(args: &MergeBaseArgs) -> Result<i32> {
    let repo = open_repo()?;
    let a = repo.resolve_name(&args.commit1)?;
    let b = repo.resolve_name(&args.commit2)?;
    if let Some(base) = repo.merge_base(a, b)? {
        println!("{base}");
    }
    Ok(0)
}
