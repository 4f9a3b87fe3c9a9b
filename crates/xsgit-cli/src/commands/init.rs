use anyhow::Result;
use clap::Args;
use xsgit_repository::{Repository, CONTROL_DIR};

#[derive(Args)]
pub struct InitArgs {}

pub fn run(_args: &InitArgs) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    Repository::init(&cwd)?;
    println!(
        "Initialized empty xsgit repository in {}",
        cwd.join(CONTROL_DIR).display()
    );
    Ok(0)
}
