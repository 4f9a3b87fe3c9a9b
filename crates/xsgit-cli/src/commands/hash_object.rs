use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use xsgit_object::ObjectKind;

use super::open_repo;

#[derive(Args)]
pub struct HashObjectArgs {
    /// File to hash and store as a blob
    file: PathBuf,
}

pub fn run(args: &HashObjectArgs) -> Result<i32> {
    let repo = open_repo()?;
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("could not read '{}'", args.file.display()))?;
    let oid = repo.odb().put(ObjectKind::Blob, &bytes)?;
    println!("{oid}");
    Ok(0)
}
