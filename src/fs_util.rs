use std::fs;
use std::io;

use camino::Utf8Path;

use crate::error::ReadsError;

/// Renames `from` to `to`, falling back to copy-and-delete across filesystems.
pub fn move_file(from: &Utf8Path, to: &Utf8Path) -> Result<(), ReadsError> {
    if from == to {
        return Ok(());
    }
    ensure_parent(to)?;
    match fs::rename(from.as_std_path(), to.as_std_path()) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from.as_std_path(), to.as_std_path())
                .map_err(|err| ReadsError::Filesystem(format!("copy {from} to {to}: {err}")))?;
            remove_file(from)
        }
        Err(err) => Err(ReadsError::Filesystem(format!(
            "move {from} to {to}: {err}"
        ))),
    }
}

pub fn remove_file(path: &Utf8Path) -> Result<(), ReadsError> {
    fs::remove_file(path.as_std_path())
        .map_err(|err| ReadsError::Filesystem(format!("remove {path}: {err}")))
}

pub fn ensure_parent(path: &Utf8Path) -> Result<(), ReadsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| ReadsError::Filesystem(format!("create {parent}: {err}")))?;
        }
    }
    Ok(())
}
