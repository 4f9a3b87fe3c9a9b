use anyhow::Result;
use clap::Args;

use super::{open_repo, short};

#[derive(Args)]
pub struct BranchArgs {
    /// Name of the branch to create; omit to list existing branches
    name: Option<String>,
    /// Commit (or resolvable name) the new branch starts at
    #[arg(default_value = "@")]
    starting: String,
}

pub fn run(args: &BranchArgs) -> Result<i32> {
    let repo = open_repo()?;
    match &args.name {
        None => {
            for entry in repo.branch_list()? {
                let prefix = if entry.is_current { "*" } else { " " };
                println!("{prefix} {}", entry.name);
            }
        }
        Some(name) => {
            let start = repo.resolve_name(&args.starting)?;
            repo.branch_create(name, start)?;
            println!("Branch {name} created at {}", short(&start));
        }
    }
    Ok(0)
}
