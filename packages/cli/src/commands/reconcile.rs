use super::{read_input, resolve};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use redline_reconcile::{Reconciler, Reconciliation};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Base Markdown document
    pub base: PathBuf,

    /// Raw change stream (a JSON array, possibly truncated)
    pub stream: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn reconcile(args: ReconcileArgs, cwd: &Path, config: &Config) -> Result<()> {
    let result = run_pipeline(&args, cwd, config)?;

    let Some(markdown) = result.markdown else {
        eprintln!("{} document unchanged", "No change:".yellow().bold());
        return Ok(());
    };

    match &args.out {
        Some(out) => {
            let out = resolve(out, cwd);
            std::fs::write(&out, format!("{}\n", markdown))
                .with_context(|| format!("Cannot write {}", out.display()))?;
            eprintln!(
                "{} {} ({}, {} changes)",
                "Wrote".green().bold(),
                out.display(),
                result.kind,
                result.changes.len()
            );
        }
        None => println!("{}", markdown),
    }

    Ok(())
}

fn run_pipeline(args: &ReconcileArgs, cwd: &Path, config: &Config) -> Result<Reconciliation> {
    let base = read_input(&args.base, cwd)?;
    let stream = read_input(&args.stream, cwd)?;
    let reconciler = Reconciler::with_options(config.reconcile.clone());
    Ok(reconciler.reconcile_detailed(base.as_str(), &stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_reconcile::PatchKind;

    fn workspace(base: &str, stream: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("base.md"), base).unwrap();
        std::fs::write(dir.path().join("stream.txt"), stream).unwrap();
        dir
    }

    fn args(out: Option<&str>) -> ReconcileArgs {
        ReconcileArgs {
            base: PathBuf::from("base.md"),
            stream: PathBuf::from("stream.txt"),
            out: out.map(PathBuf::from),
        }
    }

    #[test]
    fn test_pipeline_from_files() {
        let dir = workspace(
            "A\n\nB",
            r#"[{"line": 2, "type": "replace", "content": "B2"}]"#,
        );
        let result = run_pipeline(&args(None), dir.path(), &Config::default()).unwrap();

        assert_eq!(result.kind, PatchKind::SparsePatch);
        assert_eq!(result.markdown, Some("A\n\nB2".to_string()));
    }

    #[test]
    fn test_writes_out_file() {
        let dir = workspace("A", r#"[{"line": 1, "type": "replace", "content": "Z"}]"#);
        reconcile(args(Some("out.md")), dir.path(), &Config::default()).unwrap();

        let written = std::fs::read_to_string(dir.path().join("out.md")).unwrap();
        assert_eq!(written, "Z\n");
    }

    #[test]
    fn test_no_change_is_not_an_error() {
        let dir = workspace("A", "not a stream");
        reconcile(args(Some("out.md")), dir.path(), &Config::default()).unwrap();
        assert!(!dir.path().join("out.md").exists());
    }
}
