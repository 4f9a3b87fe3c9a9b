use anyhow::Result;
use clap::Args;
use xsgit_repository::MergeOutcome;

use super::open_repo;

#[derive(Args)]
pub struct MergeArgs {
    /// Commit (or resolvable name) to merge into HEAD
    commit: String,
}

pub fn run(args: &MergeArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid = repo.resolve_name(&args.commit)?;
    match repo.merge(oid)? {
        MergeOutcome::FastForward { new_head } => {
            println!("Fast-forwarded to {new_head}");
        }
        MergeOutcome::NeedsCommit { conflicts } => {
            if conflicts.is_empty() {
                println!("Merged in working tree; commit to conclude the merge");
            } else {
                println!("Conflicts in the following files, fix and commit to conclude the merge:");
                for path in &conflicts {
                    println!("  {path}");
                }
            }
        }
    }
    Ok(0)
}
