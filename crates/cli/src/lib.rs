use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use path_clean::PathClean;
use spatch::SourceFile;

mod pretty_error;

pub use pretty_error::PrettyErrorHandler;

pub fn absolute_path(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();

    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    }
    .clean();

    Ok(absolute_path)
}

/// Read a file, named as the user spelled it in diagnostics.
pub fn read_source(path: &Path) -> Result<SourceFile> {
    let ab_path = absolute_path(path)?;
    let text = fs::read_to_string(&ab_path)
        .with_context(|| format!("cannot read {}", ab_path.display()))?;
    Ok(SourceFile::new(path.display().to_string(), text))
}
