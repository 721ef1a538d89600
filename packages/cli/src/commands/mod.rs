pub mod classify;
pub mod index;
pub mod reconcile;

pub use classify::{classify, ClassifyArgs};
pub use index::{index, IndexArgs};
pub use reconcile::{reconcile, ReconcileArgs};

use anyhow::Context;
use std::path::{Path, PathBuf};

/// Read a file given relative to `cwd`
pub(crate) fn read_input(path: &Path, cwd: &Path) -> anyhow::Result<String> {
    let full = resolve(path, cwd);
    std::fs::read_to_string(&full).with_context(|| format!("Cannot read {}", full.display()))
}

pub(crate) fn resolve(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
