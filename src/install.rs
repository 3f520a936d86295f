use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("getting file info for {}: {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    #[error("applying file permissions to {}: {source}", path.display())]
    Apply { path: PathBuf, source: io::Error },
}

/// Add owner, group and other execute bits to `path`, keeping the rest of
/// its mode.
pub fn make_executable(path: &Path) -> Result<(), PermissionError> {
    let metadata = fs::metadata(path).map_err(|source| PermissionError::Stat {
        path: path.to_path_buf(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = metadata.permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(path, perms).map_err(|source| PermissionError::Apply {
            path: path.to_path_buf(),
            source,
        })?;
    }

    #[cfg(not(unix))]
    let _ = metadata;

    Ok(())
}
