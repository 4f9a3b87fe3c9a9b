mod add;
mod branch;
mod cat_file;
mod checkout;
mod commit;
mod diff;
mod fetch;
mod hash_object;
mod init;
mod k;
mod log;
mod merge;
mod merge_base;
mod push;
mod read_tree;
mod reset;
mod show;
mod status;
mod tag;
mod write_tree;

use anyhow::Result;
use clap::Subcommand;
use xsgit_hash::ObjectId;
use xsgit_object::Commit;
use xsgit_repository::Repository;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty repository
    Init(init::InitArgs),
    /// Compute the object id of a file and store it as a blob
    HashObject(hash_object::HashObjectArgs),
    /// Print an object's raw payload
    CatFile(cat_file::CatFileArgs),
    /// Write the current index out as a tree object
    WriteTree,
    /// Read a tree into the index and working tree
    ReadTree(read_tree::ReadTreeArgs),
    /// Record a commit from the current index
    Commit(commit::CommitArgs),
    /// Show commit history
    Log(log::LogArgs),
    /// Show a commit and its diff against its first parent
    Show(show::ShowArgs),
    /// Show changes between the index, working tree, or a commit
    Diff(diff::DiffArgs),
    /// Switch branches or restore a commit's tree
    Checkout(checkout::CheckoutArgs),
    /// Create a tag
    Tag(tag::TagArgs),
    /// List or create branches
    Branch(branch::BranchArgs),
    /// Show the working tree status
    Status,
    /// Move HEAD to an arbitrary commit
    Reset(reset::ResetArgs),
    /// Merge another commit into HEAD
    Merge(merge::MergeArgs),
    /// Find the merge base of two commits
    #[command(name = "merge-base")]
    MergeBase(merge_base::MergeBaseArgs),
    /// Fetch objects and branches from another repository
    Fetch(fetch::FetchArgs),
    /// Push a branch to another repository
    Push(push::PushArgs),
    /// Stage files or directories
    Add(add::AddArgs),
    /// Render the commit DAG as an SVG
    K,
}

/// Locate the repository containing the current directory.
pub fn open_repo() -> Result<Repository> {
    Ok(Repository::discover(std::env::current_dir()?)?)
}

/// Display an OID truncated to its first 10 hex characters, the short
/// form used throughout `log`, `branch`, and `status` output.
pub fn short(oid: &ObjectId) -> String {
    oid.to_hex()[..10].to_string()
}

/// Print a commit the way `log` and `show` both do: a header line naming
/// `oid` and any refs pointing at it, then the message indented four
/// spaces.
pub fn print_commit(oid: &ObjectId, commit: &Commit, refs: &[String]) {
    let refs_str = if refs.is_empty() {
        String::new()
    } else {
        format!(" ({})", refs.join(", "))
    };
    println!("commit {oid}{refs_str}\n");
    let message = String::from_utf8_lossy(&commit.message);
    for line in message.lines() {
        println!("    {line}");
    }
    println!();
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Init(args) => init::run(args),
        Commands::HashObject(args) => hash_object::run(args),
        Commands::CatFile(args) => cat_file::run(args),
        Commands::WriteTree => write_tree::run(),
        Commands::ReadTree(args) => read_tree::run(args),
        Commands::Commit(args) => commit::run(args),
        Commands::Log(args) => log::run(args),
        Commands::Show(args) => show::run(args),
        Commands::Diff(args) => diff::run(args),
        Commands::Checkout(args) => checkout::run(args),
        Commands::Tag(args) => tag::run(args),
        Commands::Branch(args) => branch::run(args),
        Commands::Status => status::run(),
        Commands::Reset(args) => reset::run(args),
        Commands::Merge(args) => merge::run(args),
        Commands::MergeBase(args) => merge_base::run(args),
        Commands::Fetch(args) => fetch::run(args),
        Commands::Push(args) => push::run(args),
        Commands::Add(args) => add::run(args),
        Commands::K => k::run(),
    }
}
