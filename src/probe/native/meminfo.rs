//! Parser for `/proc/meminfo`.
//!
//! Each line holds one `Key:   value [unit]` pair, e.g. `MemTotal:  16323484 kB`.
//! Only the fields needed for the snapshot are extracted.

use std::io::BufRead;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use crate::error::DegradeLevel;
use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    FileRead(#[from] fsutil::FileReadError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid value for '{key}' at line {line}: '{value}': {source}")]
    InvalidValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },
    #[error("missing field '{field}' in `{path}`")]
    MissingField { field: &'static str, path: PathBuf },
}

impl DegradeLevel for ParseError {
    fn degrade_level(&self) -> log::Level {
        match self {
            ParseError::FileRead(err) => err.degrade_level(),
            ParseError::ReadLine { .. } => log::Level::Warn,
            ParseError::InvalidValue { .. } | ParseError::MissingField { .. } => {
                log::Level::Debug
            }
        }
    }
}

const MEM_TOTAL: &str = "MemTotal";

/// Reads the total amount of memory in bytes from a meminfo file.
///
/// # Errors
///
/// - [`ParseError::FileRead`] if the file cannot be opened.
/// - [`ParseError::ReadLine`] if reading from the file fails.
/// - [`ParseError::InvalidValue`] if the `MemTotal` value is not a number.
/// - [`ParseError::MissingField`] if no `MemTotal` line exists.
pub fn read_total_memory(path: impl AsRef<Path>) -> Result<u64, ParseError> {
    let path = path.as_ref();
    let reader = fsutil::open_file_reader(path)?;
    total_memory_from_reader(reader, path)
}

fn total_memory_from_reader<R: BufRead>(mut reader: R, origin: &Path) -> Result<u64, ParseError> {
    let mut line = String::with_capacity(64);
    let mut line_no = 0;

    while reader
        .read_line(&mut line)
        .map_err(|source| ParseError::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        line_no += 1;
        if let Some((key, rest)) = line.split_once(':') {
            if key.trim() == MEM_TOTAL {
                return parse_amount(key.trim(), rest, line_no);
            }
        }
        line.clear();
    }

    Err(ParseError::MissingField {
        field: MEM_TOTAL,
        path: origin.to_path_buf(),
    })
}

/// Parses `   16323484 kB` into bytes. Values without a unit are taken as bytes.
fn parse_amount(key: &str, rest: &str, line: usize) -> Result<u64, ParseError> {
    let mut parts = rest.split_whitespace();
    let raw = parts.next().unwrap_or_default();
    let value = raw.parse::<u64>().map_err(|source| ParseError::InvalidValue {
        key: key.to_owned(),
        value: raw.to_owned(),
        line,
        source,
    })?;

    Ok(match parts.next() {
        Some(unit) if unit.eq_ignore_ascii_case("kb") => value.saturating_mul(1024),
        _ => value,
    })
}
