use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct CheckoutArgs {
    /// Branch, tag, or commit to switch to
    commit: String,
}

pub fn run(args: &CheckoutArgs) -> Result<i32> {
    let repo = open_repo()?;
    repo.checkout(&args.commit)?;
    Ok(0)
}
