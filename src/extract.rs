use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::bufread::GzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("opening archive {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("creating gzip reader for {}: {reason}", path.display())]
    Decompression { path: PathBuf, reason: String },

    #[error("reading tar file header: {0}")]
    ReadEntry(#[source] io::Error),

    #[error("archive {} is empty", path.display())]
    EmptyArchive { path: PathBuf },

    #[error("creating output file {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("writing file body to {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("no data was written to the output file {}", path.display())]
    EmptyOutput { path: PathBuf },

    #[error("syncing {} to disk: {source}", path.display())]
    Sync { path: PathBuf, source: io::Error },

    #[error("removing archive {}: {source}", path.display())]
    Cleanup { path: PathBuf, source: io::Error },
}

/// Unpack the first entry of the `.tar.gz` at `archive_path` into `dest_path`.
///
/// The destination is created or truncated, never appended to. It only
/// survives if at least one byte was written and synced to disk. The archive
/// is deleted afterwards whatever the outcome; failing to delete it replaces
/// the result with [`ExtractError::Cleanup`].
///
/// Returns the number of bytes written.
pub fn extract_single_file(archive_path: &Path, dest_path: &Path) -> Result<u64, ExtractError> {
    let outcome = extract_first_entry(archive_path, dest_path);

    if let Err(source) = fs::remove_file(archive_path) {
        return Err(ExtractError::Cleanup {
            path: archive_path.to_path_buf(),
            source,
        });
    }

    outcome
}

fn extract_first_entry(archive_path: &Path, dest_path: &Path) -> Result<u64, ExtractError> {
    let file = File::open(archive_path).map_err(|source| ExtractError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::new(file);
    check_gzip_header(&mut reader, archive_path)?;

    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut entries = archive.entries().map_err(ExtractError::ReadEntry)?;

    let mut entry = match entries.next() {
        Some(entry) => entry.map_err(ExtractError::ReadEntry)?,
        None => {
            return Err(ExtractError::EmptyArchive {
                path: archive_path.to_path_buf(),
            })
        }
    };

    if let Ok(name) = entry.path() {
        log::debug!("extracting {} to {}", name.display(), dest_path.display());
    }

    let mut out = File::create(dest_path).map_err(|source| ExtractError::Create {
        path: dest_path.to_path_buf(),
        source,
    })?;

    let written = copy_and_sync(&mut entry, &mut out, dest_path);
    drop(out);

    if written.is_err() {
        discard(dest_path);
    }

    written
}

fn check_gzip_header<R: BufRead>(reader: &mut R, path: &Path) -> Result<(), ExtractError> {
    let head = reader
        .fill_buf()
        .map_err(|e| ExtractError::Decompression {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if head.starts_with(&GZIP_MAGIC) {
        Ok(())
    } else {
        Err(ExtractError::Decompression {
            path: path.to_path_buf(),
            reason: "missing gzip header".to_string(),
        })
    }
}

fn copy_and_sync<R: Read>(
    entry: &mut R,
    out: &mut File,
    dest_path: &Path,
) -> Result<u64, ExtractError> {
    let written = io::copy(entry, out).map_err(|source| ExtractError::Write {
        path: dest_path.to_path_buf(),
        source,
    })?;

    if written == 0 {
        return Err(ExtractError::EmptyOutput {
            path: dest_path.to_path_buf(),
        });
    }

    out.sync_all().map_err(|source| ExtractError::Sync {
        path: dest_path.to_path_buf(),
        source,
    })?;

    Ok(written)
}

/// Remove a destination that failed mid-write. The extraction error is what
/// gets reported; this one is only logged.
fn discard(dest_path: &Path) {
    if let Err(e) = fs::remove_file(dest_path) {
        log::warn!(
            "failed to remove incomplete output {}: {e}",
            dest_path.display()
        );
    }
}
