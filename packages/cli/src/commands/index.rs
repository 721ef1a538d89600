use super::read_input;
use anyhow::Result;
use clap::Args;
use redline_document::{from_markdown, render_line_indexed, LineFormat};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Markdown file to index
    pub file: PathBuf,

    /// Output format (html, markdown)
    #[arg(short, long, default_value = "markdown")]
    pub format: LineFormat,
}

pub fn index(args: IndexArgs, cwd: &Path) -> Result<()> {
    let output = render_file(&args, cwd)?;
    println!("{}", output);
    Ok(())
}

fn render_file(args: &IndexArgs, cwd: &Path) -> Result<String> {
    let markdown = read_input(&args.file, cwd)?;
    let document = from_markdown(&markdown);
    tracing::debug!(blocks = document.blocks.len(), format = %args.format, "Indexing document");
    Ok(render_line_indexed(&document, args.format))
}
