use std::collections::BTreeMap;

use crate::environment::{FactTable, RuntimeKind};
use crate::error::ResultOkLogExt;
use crate::probe::{Capability, HostProbe, RuntimeDescriptor};
use crate::useragent::{self, DeviceClass, OsFamily, arch_from_navigator, identify_device};

use super::models::{EnvironmentSnapshot, UNKNOWN, or_unknown};

const SERVER_DEVICE: &str = "server";

/// Collects an [`EnvironmentSnapshot`] for the host.
///
/// Exactly one branch runs, picked by [`FactTable::runtime_kind`]. Never fails and has
/// no side effects; a failing probe only degrades the field it feeds, so repeated
/// calls against an unchanged host return equal snapshots.
pub fn collect_snapshot<P: HostProbe + ?Sized>(facts: &FactTable, probe: &P) -> EnvironmentSnapshot {
    let kind = facts.runtime_kind();
    let mut snapshot = EnvironmentSnapshot::default();
    snapshot.environment.kind = kind.as_str().to_owned();

    match kind {
        RuntimeKind::Node => collect_server(probe, &mut snapshot),
        RuntimeKind::Browser | RuntimeKind::WebWorker => {
            collect_browser(facts, kind, probe, &mut snapshot)
        }
        RuntimeKind::Deno => collect_alternate(kind, probe.deno(), &mut snapshot),
        RuntimeKind::Bun => collect_alternate(kind, probe.bun(), &mut snapshot),
        RuntimeKind::Unknown => return snapshot,
    }

    snapshot.environment.mode = Some(facts.mode().as_str().to_owned());
    snapshot
}

fn all_capabilities_off() -> BTreeMap<Capability, bool> {
    Capability::ALL.into_iter().map(|cap| (cap, false)).collect()
}

fn mark_server_device(snapshot: &mut EnvironmentSnapshot) {
    snapshot.device.kind = Some(SERVER_DEVICE.to_owned());
    snapshot.device.vendor = Some(UNKNOWN.to_owned());
    snapshot.device.model = Some(UNKNOWN.to_owned());
    snapshot.capabilities = all_capabilities_off();
}

fn collect_server<P: HostProbe + ?Sized>(probe: &P, snapshot: &mut EnvironmentSnapshot) {
    let process = probe.process().unwrap_or_default();
    let details = probe.os_details().ok_log("os details").unwrap_or_default();

    snapshot.os.name = or_unknown(Some(details.type_name));
    snapshot.os.version = or_unknown(details.release);
    snapshot.os.platform = or_unknown(Some(process.platform));
    snapshot.os.arch = or_unknown(Some(process.arch));
    snapshot.os.hostname = or_unknown(details.hostname);
    snapshot.os.cpus = details.cpus;
    snapshot.os.total_memory = details.total_memory;

    snapshot.runtime.name = or_unknown(Some(process.name));
    snapshot.runtime.version = or_unknown(Some(process.version));

    mark_server_device(snapshot);
}

fn collect_browser<P: HostProbe + ?Sized>(
    facts: &FactTable,
    kind: RuntimeKind,
    probe: &P,
    snapshot: &mut EnvironmentSnapshot,
) {
    let navigator = probe.navigator().unwrap_or_default();
    let ua = navigator.user_agent.as_str();

    let family = OsFamily::from_navigator_platform(&navigator.platform);
    snapshot.os.name = or_unknown(family.map(OsFamily::name));
    snapshot.os.version = or_unknown(family.and_then(|f| f.version_from_user_agent(ua)));
    snapshot.os.platform = or_unknown(Some(navigator.platform.as_str()));
    snapshot.os.arch = or_unknown(arch_from_navigator(ua, &navigator.platform));

    // Vendor and device facts only exist for windows; workers classify directly with
    // the same precedence.
    let (vendor, mobile, tablet) = match kind {
        RuntimeKind::Browser => (facts.browser_vendor(), facts.mobile(), facts.tablet()),
        _ => (
            useragent::classify_vendor(ua),
            useragent::is_mobile(ua),
            useragent::is_tablet(ua),
        ),
    };
    let version = vendor.and_then(|v| v.version(ua));

    snapshot.browser.name = or_unknown(vendor.map(|v| v.name()));
    snapshot.browser.version = or_unknown(version.clone());
    snapshot.browser.engine = or_unknown(vendor.map(|v| v.engine()));

    let device = identify_device(ua);
    snapshot.device.kind = Some(DeviceClass::from_flags(mobile, tablet).as_str().to_owned());
    snapshot.device.vendor = Some(device.vendor);
    snapshot.device.model = Some(device.model);

    snapshot.capabilities = Capability::ALL
        .into_iter()
        .map(|cap| {
            let available = probe
                .capability(cap)
                .ok_log("capability probe")
                .unwrap_or(false);
            (cap, available)
        })
        .collect();

    snapshot.runtime.name = or_unknown(vendor.map(|v| v.name()));
    snapshot.runtime.version = or_unknown(version);
}

fn collect_alternate(
    kind: RuntimeKind,
    descriptor: Option<RuntimeDescriptor>,
    snapshot: &mut EnvironmentSnapshot,
) {
    let descriptor = descriptor.unwrap_or_else(|| RuntimeDescriptor {
        name: kind.as_str().to_owned(),
        ..Default::default()
    });

    let family = descriptor
        .os
        .as_deref()
        .and_then(|os| OsFamily::from_process_platform(os).or_else(|| match os {
            "windows" => Some(OsFamily::Windows),
            "macos" => Some(OsFamily::MacOs),
            _ => None,
        }));
    snapshot.os.name = or_unknown(family.map(OsFamily::name));
    snapshot.os.version = Some(UNKNOWN.to_owned());
    snapshot.os.platform = or_unknown(descriptor.os);
    snapshot.os.arch = or_unknown(descriptor.arch);

    snapshot.runtime.name = or_unknown(Some(descriptor.name));
    snapshot.runtime.version = or_unknown(Some(descriptor.version));

    mark_server_device(snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::detect_facts;
    use crate::probe::{NativeHost, OsDetails, StaticHost};
    use crate::useragent::samples;
    use pretty_assertions::assert_eq;

    fn snapshot_of(host: &StaticHost) -> EnvironmentSnapshot {
        collect_snapshot(&detect_facts(host), host)
    }

    #[test]
    fn test_server_snapshot() {
        let snapshot = snapshot_of(&StaticHost::node("v20.11.1"));

        assert_eq!(snapshot.environment.kind, "node");
        assert_eq!(snapshot.environment.mode.as_deref(), Some("development"));
        assert_eq!(snapshot.os.name.as_deref(), Some("Linux"));
        assert_eq!(snapshot.os.version.as_deref(), Some("6.8.0"));
        assert_eq!(snapshot.os.platform.as_deref(), Some("linux"));
        assert_eq!(snapshot.os.arch.as_deref(), Some("x64"));
        assert_eq!(snapshot.os.hostname.as_deref(), Some("build-host"));
        assert_eq!(snapshot.os.cpus, Some(8));
        assert_eq!(snapshot.device.kind.as_deref(), Some("server"));
        assert_eq!(snapshot.runtime.name.as_deref(), Some("node"));
        assert_eq!(snapshot.runtime.version.as_deref(), Some("v20.11.1"));
        assert_eq!(snapshot.capabilities.len(), Capability::ALL.len());
        assert!(snapshot.capabilities.values().all(|on| !on));
        assert_eq!(snapshot.browser, Default::default());
    }

    #[test]
    fn test_server_snapshot_with_failing_os_probe() {
        let mut host = StaticHost::node("v20.11.1");
        host.os = None;
        let snapshot = snapshot_of(&host);

        assert_eq!(snapshot.os.name.as_deref(), Some(UNKNOWN));
        assert_eq!(snapshot.os.hostname.as_deref(), Some(UNKNOWN));
        assert_eq!(snapshot.os.cpus, None);
        assert_eq!(snapshot.os.platform.as_deref(), Some("linux"));
    }

    #[test]
    fn test_server_snapshot_partial_os_details() {
        let mut host = StaticHost::node("v20.11.1");
        host.os = Some(OsDetails {
            type_name: "Darwin".to_owned(),
            ..Default::default()
        });
        let snapshot = snapshot_of(&host.with_platform("darwin"));

        assert_eq!(snapshot.os.name.as_deref(), Some("Darwin"));
        assert_eq!(snapshot.os.version.as_deref(), Some(UNKNOWN));
        assert_eq!(snapshot.os.total_memory, None);
    }

    #[test]
    fn test_browser_snapshot() {
        let (ua, platform, _) = samples::USER_AGENTS[3];
        let host = StaticHost::browser(ua, platform)
            .with_capability(Capability::WebGl, true)
            .with_capability(Capability::LocalStorage, true)
            .with_failing_capability(Capability::Notifications);
        let snapshot = snapshot_of(&host);

        assert_eq!(snapshot.environment.kind, "browser");
        assert_eq!(snapshot.environment.mode.as_deref(), Some("unknown"));
        assert_eq!(snapshot.os.name.as_deref(), Some("macOS"));
        assert_eq!(snapshot.os.version.as_deref(), Some("10.15.7"));
        assert_eq!(snapshot.os.platform.as_deref(), Some("MacIntel"));
        assert_eq!(snapshot.browser.name.as_deref(), Some("Safari"));
        assert_eq!(snapshot.browser.version.as_deref(), Some("17.5"));
        assert_eq!(snapshot.browser.engine.as_deref(), Some("WebKit"));
        assert_eq!(snapshot.device.kind.as_deref(), Some("desktop"));
        assert_eq!(snapshot.device.vendor.as_deref(), Some(UNKNOWN));
        assert_eq!(snapshot.capabilities[&Capability::WebGl], true);
        assert_eq!(snapshot.capabilities[&Capability::LocalStorage], true);
        assert_eq!(snapshot.capabilities[&Capability::Notifications], false);
        assert_eq!(snapshot.capabilities[&Capability::Touch], false);
        assert_eq!(snapshot.capabilities.len(), Capability::ALL.len());
        assert_eq!(snapshot.os.hostname, None);
    }

    #[test]
    fn test_mobile_browser_snapshot() {
        let (ua, platform, _) = samples::USER_AGENTS[9];
        let snapshot = snapshot_of(&StaticHost::browser(ua, platform));

        assert_eq!(snapshot.os.name.as_deref(), Some("iOS"));
        assert_eq!(snapshot.os.version.as_deref(), Some("17.5"));
        assert_eq!(snapshot.device.kind.as_deref(), Some("mobile"));
        assert_eq!(snapshot.device.vendor.as_deref(), Some("Apple"));
        assert_eq!(snapshot.device.model.as_deref(), Some("iPhone"));
    }

    #[test]
    fn test_browser_name_agrees_with_vendor_facts() {
        for (ua, platform, expected) in samples::USER_AGENTS {
            let host = StaticHost::browser(ua, platform);
            let facts = detect_facts(&host);
            let snapshot = collect_snapshot(&facts, &host);

            let set: Vec<_> = useragent::BrowserVendor::PRECEDENCE
                .into_iter()
                .filter(|vendor| facts.get((*vendor).into()))
                .collect();
            assert_eq!(set.len(), 1, "user agent: {ua}");
            assert_eq!(set[0], *expected);
            assert_eq!(snapshot.browser.name.as_deref(), Some(set[0].name()));
        }
    }

    #[test]
    fn test_worker_snapshot() {
        let (ua, platform, _) = samples::USER_AGENTS[2];
        let snapshot = snapshot_of(&StaticHost::web_worker(ua, platform));

        assert_eq!(snapshot.environment.kind, "webWorker");
        assert_eq!(snapshot.browser.name.as_deref(), Some("Firefox"));
        assert_eq!(snapshot.browser.engine.as_deref(), Some("Gecko"));
        assert_eq!(snapshot.os.name.as_deref(), Some("Windows"));
    }

    #[test]
    fn test_alternate_runtime_snapshot() {
        let snapshot = snapshot_of(&StaticHost::deno("1.45.2"));

        assert_eq!(snapshot.environment.kind, "deno");
        assert_eq!(snapshot.runtime.name.as_deref(), Some("deno"));
        assert_eq!(snapshot.runtime.version.as_deref(), Some("1.45.2"));
        assert_eq!(snapshot.os.name.as_deref(), Some("Linux"));
        assert_eq!(snapshot.os.arch.as_deref(), Some("x86_64"));
        assert_eq!(snapshot.device.kind.as_deref(), Some("server"));
        assert!(snapshot.capabilities.values().all(|on| !on));
    }

    #[test]
    fn test_bun_takes_server_branch() {
        let snapshot = snapshot_of(&StaticHost::bun("1.1.20"));
        assert_eq!(snapshot.environment.kind, "node");
        assert_eq!(snapshot.runtime.name.as_deref(), Some("bun"));
    }

    #[test]
    fn test_unknown_host() {
        let snapshot = snapshot_of(&StaticHost::default());

        let expected = EnvironmentSnapshot {
            environment: crate::snapshot::EnvironmentSection {
                kind: "unknown".to_owned(),
                mode: None,
            },
            ..Default::default()
        };
        assert_eq!(snapshot, expected);
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            serde_json::json!({
                "environment": { "type": "unknown" },
                "os": {},
                "browser": {},
                "device": {},
                "capabilities": {},
                "runtime": {}
            })
        );
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let (ua, platform, _) = samples::USER_AGENTS[7];
        for host in [
            StaticHost::node("v20.11.1"),
            StaticHost::browser(ua, platform).with_capability(Capability::Touch, true),
            StaticHost::deno("1.45.2"),
            StaticHost::default(),
        ] {
            let facts = detect_facts(&host);
            assert_eq!(collect_snapshot(&facts, &host), collect_snapshot(&facts, &host));
        }

        let root = tempfile::tempdir().unwrap();
        let native = NativeHost::with_root(root.path());
        let facts = detect_facts(&native);
        assert_eq!(
            collect_snapshot(&facts, &native),
            collect_snapshot(&facts, &native)
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(snapshot_of(&StaticHost::node("v20.11.1"))).unwrap();

        assert_eq!(value["environment"]["type"], "node");
        assert_eq!(value["device"]["type"], "server");
        assert_eq!(value["os"]["totalMemory"], 16u64 * 1024 * 1024 * 1024);
        assert_eq!(value["capabilities"]["webRTC"], false);
        assert_eq!(value["capabilities"]["indexedDB"], false);
    }
}
