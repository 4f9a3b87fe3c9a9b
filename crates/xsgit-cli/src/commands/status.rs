use anyhow::Result;
use xsgit_diff::{ChangeStatus, ChangedFile};

use super::{open_repo, short};

fn action_label(status: ChangeStatus) -> &'static str {
    match status {
        ChangeStatus::Added => "new file",
        ChangeStatus::Deleted => "deleted",
        ChangeStatus::Modified => "modified",
    }
}

fn print_changed(files: &[ChangedFile]) {
    for changed in files {
        println!("{:>12}: {}", action_label(changed.status), changed.path);
    }
}

pub fn run() -> Result<i32> {
    let repo = open_repo()?;
    let report = repo.status()?;

    match &report.branch {
        Some(branch) => println!("On branch {branch}"),
        None => {
            if let Some(head) = report.head_oid {
                println!("HEAD detached at {}", short(&head));
            }
        }
    }

    if report.merge_in_progress {
        if let Some(merge_head) = repo.refs().resolve_oid("MERGE_HEAD")? {
            println!("Merging with {}", short(&merge_head));
        }
    }

    println!("\nChanges to be committed:\n");
    print_changed(&report.staged);

    println!("\nChanges not staged for commit:\n");
    print_changed(&report.not_staged);

    Ok(0)
}
