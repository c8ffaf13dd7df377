//! Envsense: runtime environment introspection.
//!
//! Answers "where am I running and under what conditions?" for the process this crate
//! is compiled into, and normalizes request-like values into one canonical shape.
//!
//! The work is split into three pure steps over a [`HostProbe`](probe::HostProbe):
//! [`environment::detect_facts`] builds the immutable fact table,
//! [`snapshot::collect_snapshot`] turns facts plus probe data into a descriptive
//! snapshot, and [`request::extract_request_info`] normalizes a request. The functions
//! at the crate root run them against the real process through [`NativeHost`].
use std::sync::LazyLock;

use environment::FactTable;
use probe::NativeHost;
use request::{RequestLike, RequestReport};
use snapshot::EnvironmentSnapshot;

pub mod environment;
pub mod error;
pub mod fsutil;
pub mod probe;
pub mod request;
pub mod snapshot;
pub mod useragent;

static HOST: LazyLock<NativeHost> = LazyLock::new(NativeHost::from_env);

static FACTS: LazyLock<FactTable> = LazyLock::new(|| environment::detect_facts(&*HOST));

/// The process-wide fact table, computed on first access and frozen afterwards.
pub fn facts() -> &'static FactTable {
    &FACTS
}

/// Whether a WebSocket facility is available right now. Evaluated on every call.
pub fn web_socket() -> bool {
    environment::web_socket(&*HOST)
}

/// Describes the current process.
///
/// Collected fresh on each call; two calls on an unchanged host compare equal.
pub fn get_info() -> EnvironmentSnapshot {
    snapshot::collect_snapshot(facts(), &*HOST)
}

/// Normalizes `request` against the process-wide fact table.
///
/// ```
/// let none: Option<&serde_json::Value> = None;
/// let report = envsense::get_request_info(none);
/// assert_eq!(report.error(), Some("No request object provided"));
/// ```
pub fn get_request_info<R: RequestLike + ?Sized>(request: Option<&R>) -> RequestReport {
    request::extract_request_info(facts(), request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_native_process_is_server_like() {
        let _ = env_logger::builder().is_test(true).try_init();

        let facts = facts();
        assert!(facts.node());
        assert!(!facts.browser());
        assert!(!facts.module());
        assert!(facts.commonjs());
        assert!(std::ptr::eq(facts, super::facts()));
    }

    #[test]
    fn test_get_info_is_stable() {
        let info = get_info();
        assert_eq!(info, get_info());
        assert_eq!(info.environment.kind, "node");
        assert_eq!(info.device.kind.as_deref(), Some("server"));
    }

    #[test]
    fn test_get_request_info() {
        let req = json!({ "url": "/health?verbose=1", "headers": { "host": "svc.local" } });
        let report = get_request_info(Some(&req));
        let info = report.info().expect("request info");

        assert_eq!(info.url.as_ref().unwrap().full, "http://svc.local/health?verbose=1");
        assert_eq!(info.client.ip.as_deref(), Some(""));
    }
}
