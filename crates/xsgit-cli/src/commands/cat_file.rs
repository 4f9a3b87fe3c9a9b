use std::io::{self, Write};

use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct CatFileArgs {
    /// Object id (or resolvable name) to print
    object: String,
}

/// Prints an object's raw payload, whatever its kind — unlike every
/// other reader in this crate, `cat-file` does not assert an expected
/// kind tag before printing.
pub fn run(args: &CatFileArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid = repo.resolve_name(&args.object)?;
    let payload = repo.odb().get(&oid, None)?;
    io::stdout().write_all(&payload)?;
    Ok(0)
}
