pub mod bake;
pub mod init;
pub mod inspect;
pub mod repair;

pub use bake::{bake, BakeArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use repair::{repair, RepairArgs};

use anyhow::{Context, Result};
use freeform_editor::{load_document, IdGenerator, LoadReport};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve `path` against the working directory
pub(crate) fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Read and repair a saved document
pub(crate) fn read_document(path: &Path) -> Result<(LoadReport, IdGenerator)> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let mut ids = IdGenerator::new(&path.display().to_string());
    let report = load_document(Some(&json), &mut ids);
    Ok((report, ids))
}
