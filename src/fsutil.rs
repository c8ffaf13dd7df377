use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{DegradeLevel, io_level};

/// Error that occurs when opening or reading a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to read file `{path}`: {source}")]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileReadError {
    /// Returns `true` if the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

impl DegradeLevel for FileReadError {
    fn degrade_level(&self) -> log::Level {
        io_level(self.is_not_found())
    }
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileReadError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use envsense::fsutil;
/// let reader = fsutil::open_file_reader("/proc/meminfo")?;
/// # Ok::<(), fsutil::FileReadError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Reads the whole file into a string.
///
/// # Errors
///
/// Returns a [`FileReadError`] if the file cannot be opened or is not valid UTF-8.
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String, FileReadError> {
    let path = path.as_ref();
    let mut out = String::new();
    open_file_reader(path)?
        .read_to_string(&mut out)
        .map_err(|source| FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(out)
}

/// Reads a file and trims surrounding whitespace. Used for single-value kernel and `/etc` files.
pub fn read_trimmed(path: impl AsRef<Path>) -> Result<String, FileReadError> {
    read_to_string(path).map(|s| s.trim().to_owned())
}
