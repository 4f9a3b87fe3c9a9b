use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Write as _;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use xsgit_object::Object;
use xsgit_ref::RefValue;
use xsgit_revwalk::iter_commits_and_parents;

use super::{open_repo, short};

/// Render every ref and the commit DAG reachable from them as a Graphviz
/// graph, piped through `dot -Tsvg` into `output.svg`.
pub fn run() -> Result<i32> {
    let repo = open_repo()?;

    let mut dot = String::from("digraph commits {\n");
    let mut oids = HashSet::new();

    for (name, value) in repo.refs().iter("", false)? {
        let target = match &value {
            RefValue::Direct(oid) => oid.to_hex(),
            RefValue::Symbolic(target) => target.clone(),
        };
        let _ = writeln!(dot, "\"{name}\" [shape=note]");
        let _ = writeln!(dot, "\"{name}\" -> \"{target}\"");
        if let RefValue::Direct(oid) = value {
            oids.insert(oid);
        }
    }

    for oid in iter_commits_and_parents(repo.odb(), oids)? {
        let commit = match repo.odb().get_object(&oid)? {
            Object::Commit(commit) => commit,
            _ => continue,
        };
        let _ = writeln!(
            dot,
            "\"{oid}\" [shape=box style=filled label=\"{}\"]",
            short(&oid)
        );
        for parent in &commit.parents {
            let _ = writeln!(dot, "\"{oid}\" -> \"{parent}\"");
        }
    }

    dot.push('}');

    let mut child = Command::new("dot")
        .arg("-Tsvg")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .context("failed to spawn 'dot' (is Graphviz installed?)")?;
    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(dot.as_bytes())?;
    let output = child.wait_with_output()?;
    std::fs::write("output.svg", output.stdout)?;
    Ok(0)
}
