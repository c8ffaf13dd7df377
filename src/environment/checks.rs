use std::path::Path;

use crate::error::ResultOkLogExt;
use crate::probe::{Filesystem, HostProbe, Result};

use super::Mode;

/// Marker files dropped into the root of container images by their runtimes.
pub const CONTAINER_MARKERS: [&str; 2] = ["/.dockerenv", "/run/.containerenv"];

/// Cgroup membership of the current process.
pub const CGROUP_PATH: &str = "/proc/self/cgroup";

/// Substrings of a cgroup path that only appear inside containers.
pub const CGROUP_CONTAINER_HINTS: [&str; 4] = ["docker", "kubepods", "containerd", "libpod"];

pub const KERNEL_VERSION_PATH: &str = "/proc/version";

/// Variables that each independently mark a CI run.
pub const CI_VARIABLES: [&str; 4] = ["CI", "CONTINUOUS_INTEGRATION", "BUILD_NUMBER", "RUN_ID"];

/// The subset of [`CI_VARIABLES`] that holds a boolean; the rest carry an id and count
/// whenever they are set.
const CI_FLAG_VARIABLES: [&str; 2] = ["CI", "CONTINUOUS_INTEGRATION"];

pub const MODE_VARIABLE: &str = "NODE_ENV";

pub const DEBUG_VARIABLES: [&str; 2] = ["DEBUG", "DEBUG_MODE"];

/// Returns true if an environment value counts as set.
///
/// Empty strings, `false` and `0` (case-insensitive) do not.
pub fn is_truthy(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") | Some("0") => false,
        Some(v) => !v.eq_ignore_ascii_case("false"),
    }
}

/// Reads a boolean-ish environment flag through the probe.
pub fn env_flag<P: HostProbe + ?Sized>(probe: &P, name: &str) -> bool {
    is_truthy(probe.env_var(name).as_deref())
}

/// Reads an environment variable that counts whenever it is set and non-empty.
pub fn env_present<P: HostProbe + ?Sized>(probe: &P, name: &str) -> bool {
    probe.env_var(name).is_some_and(|v| !v.trim().is_empty())
}

/// Returns true if any of the [`CI_VARIABLES`] is set.
///
/// `CI` and `CONTINUOUS_INTEGRATION` must be truthy; `BUILD_NUMBER` and `RUN_ID` only
/// need to be present, so `BUILD_NUMBER=0` still marks a CI run.
pub fn has_ci_signal<P: HostProbe + ?Sized>(probe: &P) -> bool {
    CI_VARIABLES.iter().any(|name| {
        if CI_FLAG_VARIABLES.contains(name) {
            env_flag(probe, name)
        } else {
            env_present(probe, name)
        }
    })
}

/// Maps the raw `NODE_ENV` value to a mode. Unset and empty both mean development.
pub fn mode_from_env(value: Option<&str>) -> Mode {
    match value {
        None | Some("") => Mode::Development,
        Some("production") => Mode::Production,
        Some("development") => Mode::Development,
        Some("test") => Mode::Test,
        Some(_) => Mode::Unknown,
    }
}

/// Returns true if any known container marker file exists.
///
/// Every marker is checked on its own; a marker whose existence cannot be checked is
/// logged and skipped.
pub fn has_container_marker(fs: &dyn Filesystem) -> bool {
    CONTAINER_MARKERS.iter().any(|marker| {
        fs.exists(Path::new(marker))
            .ok_log("container marker check")
            .unwrap_or(false)
    })
}

/// Returns true if the cgroup file of the current process names a container runtime.
///
/// Besides the [`CGROUP_CONTAINER_HINTS`], a path segment of at least 32 hex digits
/// counts as a container id.
///
/// # Errors
///
/// Returns the probe error if the cgroup file cannot be read.
pub fn matches_container_cgroup(fs: &dyn Filesystem) -> Result<bool> {
    let contents = fs.read_to_string(Path::new(CGROUP_PATH))?;

    Ok(contents.lines().any(|line| {
        CGROUP_CONTAINER_HINTS.iter().any(|hint| line.contains(hint))
            || line
                .split('/')
                .any(|part| part.len() >= 32 && is_non_empty_hex_string(part))
    }))
}

/// Returns true if the kernel identifies itself as a WSL kernel.
///
/// # Errors
///
/// Returns the probe error if the kernel version file cannot be read.
pub fn is_wsl_kernel(fs: &dyn Filesystem) -> Result<bool> {
    let version = fs.read_to_string(Path::new(KERNEL_VERSION_PATH))?;
    Ok(version.to_ascii_lowercase().contains("microsoft"))
}

/// Returns true if the input string is not empty and contains only ASCII hex digits.
pub fn is_non_empty_hex_string(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.chars().all(|c| c.is_ascii_hexdigit())
}
