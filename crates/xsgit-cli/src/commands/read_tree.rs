use anyhow::Result;
use clap::Args;
use xsgit_repository::expand_tree;

use super::open_repo;

#[derive(Args)]
pub struct ReadTreeArgs {
    /// Tree (or resolvable name) to load into the index
    tree: String,
}

/// Loads `tree` into the index only; unlike `checkout`, the working tree
/// is left untouched.
pub fn run(args: &ReadTreeArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid = repo.resolve_name(&args.tree)?;
    let entries = expand_tree(repo.odb(), oid)?;
    repo.with_index(|index| {
        index.replace_all(entries);
        Ok(())
    })?;
    Ok(0)
}
