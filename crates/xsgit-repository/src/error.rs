use std::path::PathBuf;

use xsgit_diff::DiffError;
use xsgit_hash::HashError;
use xsgit_index::IndexError;
use xsgit_merge::MergeError;
use xsgit_object::ObjectError;
use xsgit_odb::OdbError;
use xsgit_ref::RefError;
use xsgit_revwalk::RevWalkError;

/// Errors produced by repository-level operations.
///
/// Wraps every layer's own error type — corruption, not-found,
/// precondition, and I/O failures are each represented by one or more of
/// these variants — so the CLI can map a single enum to a fatal exit.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a repository: {0}")]
    NotARepository(PathBuf),

    #[error("unknown name '{0}'")]
    NotFound(String),

    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    RevWalk(#[from] RevWalkError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
