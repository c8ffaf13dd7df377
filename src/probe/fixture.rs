//! A scripted host.
//!
//! [`StaticHost`] answers every probe from data it was constructed with. Tests use it
//! to stand in for browsers, workers and alternate runtimes; embedders that gather
//! host facts elsewhere (for example across a JS bridge) can deserialize one from JSON.
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::{
    Capability, Filesystem, Global, HostProbe, NavigatorInfo, OsDetails, ProbeError,
    ProcessInfo, Result, RuntimeDescriptor,
};

/// In-memory filesystem keyed by absolute path.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryFs {
    pub files: BTreeMap<PathBuf, String>,
    /// Paths that exist but cannot be read.
    pub unreadable: BTreeSet<PathBuf>,
}

impl Filesystem for MemoryFs {
    fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.files.contains_key(path) || self.unreadable.contains(path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        if self.unreadable.contains(path) {
            return Err(ProbeError::FileRead(crate::fsutil::FileReadError {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| {
                ProbeError::FileRead(crate::fsutil::FileReadError {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticHost {
    pub globals: BTreeSet<Global>,
    pub process: Option<ProcessInfo>,
    pub env: BTreeMap<String, String>,
    pub os: Option<OsDetails>,
    pub navigator: Option<NavigatorInfo>,
    /// `None` makes the frame check fail, as a cross-origin parent would.
    pub framed: Option<bool>,
    pub deno: Option<RuntimeDescriptor>,
    pub bun: Option<RuntimeDescriptor>,
    /// `None` makes the module probe fail, as a host without dynamic evaluation would.
    pub module: Option<bool>,
    /// `None` means the host has no filesystem API at all.
    pub filesystem: Option<MemoryFs>,
    pub capabilities: BTreeMap<Capability, bool>,
    /// Capabilities whose probe raises.
    pub failing_capabilities: BTreeSet<Capability>,
}

impl StaticHost {
    /// A Node-like server runtime on 64-bit Linux without any environment variables.
    pub fn node(version: &str) -> Self {
        let mut versions = BTreeMap::new();
        versions.insert("node".to_owned(), version.trim_start_matches('v').to_owned());
        Self {
            globals: [Global::Process].into(),
            process: Some(ProcessInfo {
                name: "node".to_owned(),
                version: version.to_owned(),
                platform: "linux".to_owned(),
                arch: "x64".to_owned(),
                versions,
            }),
            os: Some(OsDetails {
                type_name: "Linux".to_owned(),
                release: Some("6.8.0".to_owned()),
                hostname: Some("build-host".to_owned()),
                cpus: Some(8),
                total_memory: Some(16 * 1024 * 1024 * 1024),
            }),
            module: Some(false),
            filesystem: Some(MemoryFs::default()),
            ..Default::default()
        }
    }

    /// A top-level browser window.
    pub fn browser(user_agent: &str, platform: &str) -> Self {
        Self {
            globals: [Global::Window, Global::Document, Global::Navigator].into(),
            navigator: Some(NavigatorInfo {
                user_agent: user_agent.to_owned(),
                platform: platform.to_owned(),
            }),
            framed: Some(false),
            module: Some(true),
            ..Default::default()
        }
    }

    /// A dedicated web worker.
    pub fn web_worker(user_agent: &str, platform: &str) -> Self {
        Self {
            globals: [
                Global::WorkerGlobalScope,
                Global::ImportScripts,
                Global::Navigator,
            ]
            .into(),
            navigator: Some(NavigatorInfo {
                user_agent: user_agent.to_owned(),
                platform: platform.to_owned(),
            }),
            module: Some(true),
            ..Default::default()
        }
    }

    pub fn deno(version: &str) -> Self {
        Self {
            globals: [Global::Deno].into(),
            deno: Some(RuntimeDescriptor {
                name: "deno".to_owned(),
                version: version.to_owned(),
                os: Some("linux".to_owned()),
                arch: Some("x86_64".to_owned()),
            }),
            module: Some(true),
            ..Default::default()
        }
    }

    /// Bun also ships a Node-compatible `process`.
    pub fn bun(version: &str) -> Self {
        let mut host = Self::node("v22.6.0");
        host.globals.insert(Global::Bun);
        if let Some(process) = host.process.as_mut() {
            process.name = "bun".to_owned();
            process.version = version.to_owned();
            process
                .versions
                .insert("bun".to_owned(), version.to_owned());
        }
        host.bun = Some(RuntimeDescriptor {
            name: "bun".to_owned(),
            version: version.to_owned(),
            os: None,
            arch: None,
        });
        host
    }

    pub fn with_global(mut self, global: Global) -> Self {
        self.globals.insert(global);
        self
    }

    /// Adds a global after construction, like a polyfill loaded late.
    pub fn install_global(&mut self, global: Global) {
        self.globals.insert(global);
    }

    pub fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        if let Some(process) = self.process.as_mut() {
            process.platform = platform.to_owned();
        }
        if let Some(navigator) = self.navigator.as_mut() {
            navigator.platform = platform.to_owned();
        }
        self
    }

    pub fn with_process_version(mut self, component: &str, version: &str) -> Self {
        if let Some(process) = self.process.as_mut() {
            process
                .versions
                .insert(component.to_owned(), version.to_owned());
        }
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.filesystem
            .get_or_insert_with(MemoryFs::default)
            .files
            .insert(path.into(), contents.to_owned());
        self
    }

    pub fn with_unreadable_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.filesystem
            .get_or_insert_with(MemoryFs::default)
            .unreadable
            .insert(path.into());
        self
    }

    pub fn without_filesystem(mut self) -> Self {
        self.filesystem = None;
        self
    }

    pub fn with_module(mut self, module: Option<bool>) -> Self {
        self.module = module;
        self
    }

    pub fn with_framed(mut self, framed: Option<bool>) -> Self {
        self.framed = framed;
        self
    }

    pub fn with_capability(mut self, capability: Capability, available: bool) -> Self {
        self.capabilities.insert(capability, available);
        self
    }

    pub fn with_failing_capability(mut self, capability: Capability) -> Self {
        self.failing_capabilities.insert(capability);
        self
    }
}

impl HostProbe for StaticHost {
    fn has_global(&self, global: Global) -> bool {
        self.globals.contains(&global)
    }

    fn process(&self) -> Option<ProcessInfo> {
        self.process.clone()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn os_details(&self) -> Result<OsDetails> {
        self.os
            .clone()
            .ok_or(ProbeError::Unsupported("operating system details"))
    }

    fn navigator(&self) -> Option<NavigatorInfo> {
        self.navigator.clone()
    }

    fn is_framed(&self) -> Result<bool> {
        self.framed.ok_or_else(|| ProbeError::Failed {
            probe: "window.top".to_owned(),
            reason: "cross-origin access denied".to_owned(),
        })
    }

    fn deno(&self) -> Option<RuntimeDescriptor> {
        self.deno.clone()
    }

    fn bun(&self) -> Option<RuntimeDescriptor> {
        self.bun.clone()
    }

    fn module_execution(&self) -> Result<bool> {
        self.module
            .ok_or(ProbeError::Unsupported("dynamic module evaluation"))
    }

    fn filesystem(&self) -> Option<&dyn Filesystem> {
        self.filesystem.as_ref().map(|fs| fs as &dyn Filesystem)
    }

    fn capability(&self, capability: Capability) -> Result<bool> {
        if self.failing_capabilities.contains(&capability) {
            return Err(ProbeError::Failed {
                probe: format!("{capability:?}"),
                reason: "probe raised".to_owned(),
            });
        }
        Ok(self.capabilities.get(&capability).copied().unwrap_or(false))
    }
}
