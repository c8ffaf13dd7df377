//! Host probes.
//!
//! Everything this crate knows about its surroundings comes through a [`HostProbe`]:
//! which global objects exist, what the server-like process reports about itself,
//! environment variables, the navigator strings of a browser-like host, and a
//! best-effort view of the filesystem. Fact derivation and both normalizers are pure
//! functions over a probe, so they can be driven by the real process
//! ([`NativeHost`]) or by a scripted host ([`StaticHost`]).
use std::collections::BTreeMap;
use std::path::Path;

mod error;
pub mod fixture;
pub mod native;

pub use error::{ProbeError, Result};
pub use fixture::StaticHost;
pub use native::NativeHost;

/// Global objects whose mere presence is a signal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Global {
    Window,
    Document,
    Navigator,
    Process,
    WorkerGlobalScope,
    ImportScripts,
    ServiceWorkerGlobalScope,
    WebSocket,
    Deno,
    Bun,
}

/// Browser capabilities reported in the snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Capability {
    #[serde(rename = "touch")]
    Touch,
    #[serde(rename = "webgl")]
    WebGl,
    #[serde(rename = "serviceWorker")]
    ServiceWorker,
    #[serde(rename = "webRTC")]
    WebRtc,
    #[serde(rename = "webAssembly")]
    WebAssembly,
    #[serde(rename = "localStorage")]
    LocalStorage,
    #[serde(rename = "sessionStorage")]
    SessionStorage,
    #[serde(rename = "indexedDB")]
    IndexedDb,
    #[serde(rename = "geolocation")]
    Geolocation,
    #[serde(rename = "notifications")]
    Notifications,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::Touch,
        Capability::WebGl,
        Capability::ServiceWorker,
        Capability::WebRtc,
        Capability::WebAssembly,
        Capability::LocalStorage,
        Capability::SessionStorage,
        Capability::IndexedDb,
        Capability::Geolocation,
        Capability::Notifications,
    ];
}

/// What a server-like runtime says about itself (`process` in JS hosts).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessInfo {
    /// Runtime name, e.g. `node` or `rust`.
    pub name: String,
    pub version: String,
    /// Platform in Node naming (`linux`, `darwin`, `win32`, ...).
    pub platform: String,
    /// Architecture in Node naming (`x64`, `arm64`, `ia32`, ...).
    pub arch: String,
    /// Component versions, e.g. `node`, `v8`, `electron`.
    pub versions: BTreeMap<String, String>,
}

/// The two navigator strings a browser-like host exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigatorInfo {
    pub user_agent: String,
    pub platform: String,
}

/// Operating system facilities of a server-like runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OsDetails {
    /// OS type name (`Linux`, `Darwin`, `Windows_NT`).
    #[serde(rename = "type")]
    pub type_name: String,
    pub release: Option<String>,
    pub hostname: Option<String>,
    pub cpus: Option<usize>,
    /// Total memory in bytes.
    pub total_memory: Option<u64>,
}

/// Self-description of an alternate runtime (`Deno.version`, `Bun.version`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeDescriptor {
    pub name: String,
    pub version: String,
    pub os: Option<String>,
    pub arch: Option<String>,
}

/// Best-effort read access to the host filesystem.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> Result<bool>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// The capability set a host offers for introspection.
///
/// Implementations must not panic; anything that cannot be answered is either an
/// absent value or a [`ProbeError`], and callers degrade the affected fact.
pub trait HostProbe {
    /// Reports whether the named global object exists.
    fn has_global(&self, global: Global) -> bool;

    /// Returns the server-like process description, if the host has one.
    fn process(&self) -> Option<ProcessInfo>;

    /// Looks up a process environment variable.
    ///
    /// Callers only consult this for server-like hosts.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Reads operating system facilities of a server-like host.
    fn os_details(&self) -> Result<OsDetails>;

    /// Returns the navigator strings of a browser-like host.
    fn navigator(&self) -> Option<NavigatorInfo>;

    /// Returns `true` if the window is not the top-level browsing context.
    fn is_framed(&self) -> Result<bool>;

    fn deno(&self) -> Option<RuntimeDescriptor>;

    fn bun(&self) -> Option<RuntimeDescriptor>;

    /// Reports whether code runs with module (ESM) semantics.
    ///
    /// This is a heuristic. Hosts that detect it by dynamically evaluating
    /// module-only syntax misreport as non-module when dynamic evaluation is disabled.
    fn module_execution(&self) -> Result<bool>;

    /// Returns the filesystem, or `None` if the host has no filesystem API.
    fn filesystem(&self) -> Option<&dyn Filesystem>;

    /// Probes a single browser capability.
    fn capability(&self, capability: Capability) -> Result<bool>;
}
