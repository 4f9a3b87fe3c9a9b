use anyhow::Result;
use xsgit_repository::build_tree_from_index;

use super::open_repo;

pub fn run() -> Result<i32> {
    let repo = open_repo()?;
    let oid = repo.with_index(|index| Ok(build_tree_from_index(repo.odb(), index.as_map())?))?;
    println!("{oid}");
    Ok(0)
}
