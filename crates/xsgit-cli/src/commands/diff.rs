use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use xsgit_hash::ObjectId;
use xsgit_object::Object;
use xsgit_repository::{expand_tree, scan_working_tree, Repository};

use super::open_repo;

#[derive(Args)]
pub struct DiffArgs {
    /// Compare the index against HEAD instead of the working tree
    #[arg(long)]
    cached: bool,
    /// Commit (or resolvable name) to diff against, instead of HEAD/the index
    commit: Option<String>,
}

fn tree_of(repo: &Repository, oid: ObjectId) -> Result<BTreeMap<String, ObjectId>> {
    match repo.odb().get_object(&oid)? {
        Object::Commit(commit) => Ok(expand_tree(repo.odb(), commit.tree)?),
        other => anyhow::bail!("expected {oid} to be a commit, found a {}", other.kind()),
    }
}

pub fn run(args: &DiffArgs) -> Result<i32> {
    let repo = open_repo()?;
    let index_map = repo.with_index(|index| Ok(index.as_map().clone()))?;

    let (tree_from, tree_to) = if let Some(commit) = &args.commit {
        let oid = repo.resolve_name(commit)?;
        let tree_from = tree_of(&repo, oid)?;
        let tree_to = if args.cached {
            index_map
        } else {
            scan_working_tree(repo.odb(), repo.work_dir(), repo.control_dir())?
        };
        (tree_from, tree_to)
    } else if args.cached {
        let head = repo.resolve_name("@")?;
        (tree_of(&repo, head)?, index_map)
    } else {
        let working = scan_working_tree(repo.odb(), repo.work_dir(), repo.control_dir())?;
        (index_map, working)
    };

    for changed in xsgit_diff::iter_changed_files(&tree_from, &tree_to) {
        let bytes = xsgit_diff::text_diff(
            repo.odb(),
            &changed.path,
            changed.old_oid,
            changed.new_oid,
        )?;
        io::stdout().write_all(&bytes)?;
    }
    Ok(0)
}
