use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use xsgit_repository::Repository;

use super::open_repo;

#[derive(Args)]
pub struct PushArgs {
    /// Path to the remote repository's working directory
    remote: PathBuf,
    /// Local branch to push
    branch: String,
}

pub fn run(args: &PushArgs) -> Result<i32> {
    let local = open_repo()?;
    let remote = Repository::open(&args.remote)?;
    xsgit_remote::push(&local, &remote, &format!("refs/heads/{}", args.branch))?;
    Ok(0)
}
