use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use xsgit_repository::Repository;

use super::open_repo;

#[derive(Args)]
pub struct FetchArgs {
    /// Path to the remote repository's working directory
    remote: PathBuf,
}

pub fn run(args: &FetchArgs) -> Result<i32> {
    let local = open_repo()?;
    let remote = Repository::open(&args.remote)?;
    xsgit_remote::fetch(&local, &remote)?;
    Ok(0)
}
