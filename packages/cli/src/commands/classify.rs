use super::read_input;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use redline_reconcile::{Change, PatchKind, Reconciler};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Raw change stream
    pub stream: PathBuf,
}

#[derive(Debug, Serialize)]
struct Classification {
    kind: PatchKind,
    changes: Vec<Change>,
}

pub fn classify(args: ClassifyArgs, cwd: &Path, config: &Config) -> Result<()> {
    let classification = classify_file(&args, cwd, config)?;
    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}

fn classify_file(args: &ClassifyArgs, cwd: &Path, config: &Config) -> Result<Classification> {
    let stream = read_input(&args.stream, cwd)?;
    let reconciler = Reconciler::with_options(config.reconcile.clone());
    let changes = reconciler.parse(&stream);
    let kind = reconciler.classify(&changes);
    Ok(Classification { kind, changes })
}
