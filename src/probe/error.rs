use std::path::PathBuf;

use crate::error::DegradeLevel;
use crate::fsutil::FileReadError;

use super::native::meminfo;

/// Errors raised while probing the host. They are never surfaced past fact
/// derivation or snapshot collection.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),
    #[error("probe `{probe}` failed: {reason}")]
    Failed { probe: String, reason: String },
    #[error("failed to check if path `{path}` exists: {source}")]
    ExistenceCheck {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    FileRead(#[from] FileReadError),
    #[error("failed to parse meminfo: {0}")]
    Meminfo(#[from] meminfo::ParseError),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

impl DegradeLevel for ProbeError {
    fn degrade_level(&self) -> log::Level {
        match self {
            ProbeError::Unsupported(_) | ProbeError::Failed { .. } => log::Level::Debug,
            ProbeError::ExistenceCheck { source, .. } => source.degrade_level(),
            ProbeError::FileRead(err) => err.degrade_level(),
            ProbeError::Meminfo(err) => err.degrade_level(),
        }
    }
}
