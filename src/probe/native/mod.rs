//! Probe for the process this crate is compiled into.
//!
//! A native process is a server-like runtime: it owns environment variables, a
//! platform and an architecture, and can look at the filesystem. It has none of the
//! browser globals.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ResultOkLogExt;
use crate::fsutil;

use super::{
    Capability, Filesystem, Global, HostProbe, NavigatorInfo, OsDetails, ProbeError,
    ProcessInfo, Result, RuntimeDescriptor,
};

pub mod meminfo;

/// Environment variable naming an alternate root for filesystem probes.
pub const ROOTFS_ENV: &str = "ENVSENSE_ROOTFS";

/// Name reported as the runtime of a native process.
pub const RUNTIME_NAME: &str = "rust";

const RUSTC_VERSION: &str = env!("ENVSENSE_RUSTC_VERSION");

/// Filesystem view rooted at a directory; absolute paths are resolved below it.
#[derive(Debug, Clone)]
pub struct RootedFs {
    root: PathBuf,
}

impl RootedFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps an absolute host path into this root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match path.strip_prefix("/") {
            Ok(relative) => self.root.join(relative),
            Err(_) => self.root.join(path),
        }
    }
}

impl Filesystem for RootedFs {
    fn exists(&self, path: &Path) -> Result<bool> {
        let path = self.resolve(path);
        path.try_exists()
            .map_err(|source| ProbeError::ExistenceCheck { path, source })
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fsutil::read_to_string(self.resolve(path))?)
    }
}

/// The real process.
#[derive(Debug, Clone)]
pub struct NativeHost {
    fs: RootedFs,
    module_execution: Option<bool>,
}

impl Default for NativeHost {
    fn default() -> Self {
        Self::with_root("/")
    }
}

impl NativeHost {
    /// Creates a probe whose filesystem view is rooted at `root`.
    ///
    /// Useful when the host root is mounted somewhere else, e.g. `/rootfs` inside a container.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            fs: RootedFs::new(root),
            module_execution: None,
        }
    }

    /// Creates a probe rooted at `$ENVSENSE_ROOTFS`, or at `/` if it is unset.
    pub fn from_env() -> Self {
        let root = std::env::var_os(ROOTFS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));
        log::debug!("Native host filesystem root: {}", root.display());
        Self::with_root(root)
    }

    /// Declares the module execution style. Native code cannot detect it, so the
    /// embedding build has to say so.
    pub fn with_module_execution(mut self, module: bool) -> Self {
        self.module_execution = Some(module);
        self
    }

    /// Reads a single-value file below the root, trimmed.
    fn read_value(&self, path: &str) -> std::result::Result<String, fsutil::FileReadError> {
        fsutil::read_trimmed(self.fs.resolve(Path::new(path)))
    }

    fn read_hostname(&self) -> Option<String> {
        self.read_value("/etc/hostname")
            .or_else(|_| self.read_value("/proc/sys/kernel/hostname"))
            .ok_log("hostname")
            .filter(|name| !name.is_empty())
    }
}

/// Maps a Rust target OS name to the Node platform name.
pub fn node_platform(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// Maps a Rust target architecture to the Node architecture name.
pub fn node_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "powerpc64" => "ppc64",
        other => other,
    }
}

/// Maps a Rust target OS name to the OS type name (`uname -s` style).
pub fn os_type_name(os: &str) -> String {
    match os {
        "linux" | "android" => "Linux".to_owned(),
        "macos" | "ios" => "Darwin".to_owned(),
        "windows" => "Windows_NT".to_owned(),
        "freebsd" => "FreeBSD".to_owned(),
        "openbsd" => "OpenBSD".to_owned(),
        other => other.to_owned(),
    }
}

impl HostProbe for NativeHost {
    fn has_global(&self, global: Global) -> bool {
        matches!(global, Global::Process)
    }

    fn process(&self) -> Option<ProcessInfo> {
        let mut versions = BTreeMap::new();
        versions.insert("rustc".to_owned(), RUSTC_VERSION.to_owned());
        versions.insert(
            env!("CARGO_PKG_NAME").to_owned(),
            env!("CARGO_PKG_VERSION").to_owned(),
        );

        Some(ProcessInfo {
            name: RUNTIME_NAME.to_owned(),
            version: RUSTC_VERSION.to_owned(),
            platform: node_platform(std::env::consts::OS).to_owned(),
            arch: node_arch(std::env::consts::ARCH).to_owned(),
            versions,
        })
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn os_details(&self) -> Result<OsDetails> {
        let release = self
            .read_value("/proc/sys/kernel/osrelease")
            .ok_log("kernel release")
            .filter(|release| !release.is_empty());
        let total_memory =
            meminfo::read_total_memory(self.fs.resolve(Path::new("/proc/meminfo")))
                .ok_log("total memory");
        let cpus = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .ok_log("cpu count");

        Ok(OsDetails {
            type_name: os_type_name(std::env::consts::OS),
            release,
            hostname: self.read_hostname(),
            cpus,
            total_memory,
        })
    }

    fn navigator(&self) -> Option<NavigatorInfo> {
        None
    }

    fn is_framed(&self) -> Result<bool> {
        Err(ProbeError::Unsupported("frame inspection"))
    }

    fn deno(&self) -> Option<RuntimeDescriptor> {
        None
    }

    fn bun(&self) -> Option<RuntimeDescriptor> {
        None
    }

    fn module_execution(&self) -> Result<bool> {
        self.module_execution
            .ok_or(ProbeError::Unsupported("dynamic module evaluation"))
    }

    fn filesystem(&self) -> Option<&dyn Filesystem> {
        Some(&self.fs)
    }

    fn capability(&self, _capability: Capability) -> Result<bool> {
        Ok(false)
    }
}
