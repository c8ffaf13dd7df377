//! Environment snapshots.
mod collect;
mod models;

pub use collect::collect_snapshot;
pub use models::{
    BrowserSection, DeviceSection, EnvironmentSection, EnvironmentSnapshot, OsSection,
    RuntimeSection, UNKNOWN,
};
