use crate::error::ResultOkLogExt;
use crate::probe::{Filesystem, Global, HostProbe};
use crate::useragent::{self, OsFamily};

use super::checks::{
    self, has_container_marker, is_wsl_kernel, matches_container_cgroup, mode_from_env,
};
use super::{Fact, FactTable, Mode};

/// Detects whether the host looks like a container.
///
/// Checks the marker files first and the cgroup file second. Probe failures of
/// either check are logged and count as "no evidence"; so does a missing filesystem.
pub fn detect_container(fs: Option<&dyn Filesystem>) -> bool {
    let Some(fs) = fs else {
        log::debug!("No filesystem available, assuming not containerized");
        return false;
    };

    has_container_marker(fs)
        || matches_container_cgroup(fs)
            .ok_log("cgroup analysis during container detection")
            .unwrap_or(false)
}

/// Derives the full [`FactTable`] from a host probe.
///
/// Never fails: a probe that errors degrades its fact to `false`, or for the mode
/// flags to the documented default. Environment variables and the filesystem are
/// only consulted when the host is a server-like runtime.
pub fn detect_facts<P: HostProbe + ?Sized>(probe: &P) -> FactTable {
    let mut values = [false; Fact::COUNT];
    let mut set = |fact: Fact, value: bool| values[fact as usize] = value;

    let process = probe
        .process()
        .filter(|_| probe.has_global(Global::Process));
    let node = process.is_some();
    let browser = probe.has_global(Global::Window) && probe.has_global(Global::Document);
    let module = probe.module_execution().ok_log("module probe").unwrap_or(false);

    set(Fact::Browser, browser);
    set(Fact::Node, node);
    set(
        Fact::WebWorker,
        probe.has_global(Global::WorkerGlobalScope) && probe.has_global(Global::ImportScripts),
    );
    set(
        Fact::ServiceWorker,
        probe.has_global(Global::ServiceWorkerGlobalScope),
    );
    set(Fact::Deno, probe.has_global(Global::Deno));
    set(Fact::Bun, probe.has_global(Global::Bun));
    set(Fact::Module, module);
    set(Fact::CommonJs, node && !module);
    set(
        Fact::Iframe,
        browser && probe.is_framed().ok_log("frame check").unwrap_or(false),
    );

    if let Some(process) = &process {
        let fs = probe.filesystem();
        let flag = |name: &str| checks::env_flag(probe, name);
        let mode = mode_from_env(probe.env_var(checks::MODE_VARIABLE).as_deref());

        set(Fact::Electron, process.versions.contains_key("electron"));
        set(Fact::Containerized, detect_container(fs));
        set(
            Fact::Wsl,
            fs.and_then(|fs| is_wsl_kernel(fs).ok_log("wsl check"))
                .unwrap_or(false),
        );
        set(Fact::Debug, checks::DEBUG_VARIABLES.iter().any(|name| flag(name)));
        set(Fact::Production, mode == Mode::Production);
        set(Fact::Development, mode == Mode::Development);
        set(Fact::Test, mode == Mode::Test);
        set(Fact::Ci, checks::has_ci_signal(probe));
        set(Fact::GithubActions, flag("GITHUB_ACTIONS"));
        set(Fact::Gitlab, flag("GITLAB_CI"));
        set(Fact::CircleCi, flag("CIRCLECI"));
        set(Fact::Travis, flag("TRAVIS"));
        set(Fact::Jenkins, flag("JENKINS_URL"));
        set(Fact::AzurePipelines, flag("TF_BUILD"));
        set(Fact::Bitbucket, flag("BITBUCKET_BUILD_NUMBER"));
        set(Fact::Vercel, flag("VERCEL"));
        set(Fact::Netlify, flag("NETLIFY"));
        set(Fact::AwsLambda, flag("AWS_LAMBDA_FUNCTION_NAME"));

        if let Some(family) = OsFamily::from_process_platform(&process.platform) {
            set(Fact::from(family), true);
        }
    }

    if browser {
        if let Some(navigator) = probe.navigator() {
            let ua = navigator.user_agent.as_str();
            if let Some(vendor) = useragent::classify_vendor(ua) {
                set(Fact::from(vendor), true);
            }
            set(Fact::Mobile, useragent::is_mobile(ua));
            set(Fact::Tablet, useragent::is_tablet(ua));

            if !node {
                if let Some(family) = OsFamily::from_navigator_platform(&navigator.platform) {
                    set(Fact::from(family), true);
                }
            }
        }
    }

    let table = FactTable::new(values);
    log::trace!(
        "Derived facts: {:?}",
        table.iter().filter(|(_, v)| *v).map(|(f, _)| f.as_str()).collect::<Vec<_>>()
    );
    table
}

/// Reports whether a `WebSocket` implementation is available right now.
///
/// Not part of the fact table: the global may be polyfilled after the table was built.
pub fn web_socket<P: HostProbe + ?Sized>(probe: &P) -> bool {
    probe.has_global(Global::WebSocket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{Capability, StaticHost};
    use crate::useragent::samples;

    const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_node_host() {
        init_logger();
        let facts = detect_facts(&StaticHost::node("v20.11.1"));

        assert!(facts.node());
        assert!(!facts.browser());
        assert!(!facts.web_worker());
        assert!(facts.commonjs());
        assert!(!facts.module());
        assert!(facts.linux());
        assert!(!facts.chrome());
        assert!(!facts.containerized());
    }

    #[test]
    fn test_browser_host() {
        init_logger();
        let facts = detect_facts(&StaticHost::browser(CHROME_MAC, "MacIntel"));

        assert!(facts.browser());
        assert!(!facts.node());
        assert!(facts.chrome());
        assert!(!facts.safari());
        assert!(facts.macos());
        assert!(!facts.mobile());
        assert!(!facts.iframe());
        assert!(facts.module());
        assert!(!facts.commonjs());
    }

    #[test]
    fn test_commonjs_is_node_and_not_module() {
        for node in [true, false] {
            for module in [true, false] {
                let host = if node {
                    StaticHost::node("v20.11.1")
                } else {
                    StaticHost::browser(CHROME_MAC, "MacIntel")
                }
                .with_module(Some(module));
                let facts = detect_facts(&host);

                assert_eq!(facts.node(), node);
                assert_eq!(facts.module(), module);
                assert_eq!(facts.commonjs(), node && !module, "node={node} module={module}");
            }
        }
    }

    #[test]
    fn test_failed_module_probe_means_not_module() {
        let facts = detect_facts(&StaticHost::node("v20.11.1").with_module(None));
        assert!(!facts.module());
        assert!(facts.commonjs());
    }

    #[test]
    fn test_mode_flags() {
        let unset = detect_facts(&StaticHost::node("v20.11.1"));
        assert!(unset.development());
        assert!(!unset.production());
        assert!(!unset.test());

        let production = detect_facts(&StaticHost::node("v20.11.1").with_env("NODE_ENV", "production"));
        assert!(production.production());
        assert!(!production.development());
        assert!(!production.test());

        let test = detect_facts(&StaticHost::node("v20.11.1").with_env("NODE_ENV", "test"));
        assert!(test.test());
        assert!(!test.development());

        let other = detect_facts(&StaticHost::node("v20.11.1").with_env("NODE_ENV", "staging"));
        assert!(!other.production());
        assert!(!other.development());
        assert!(!other.test());
    }

    #[test]
    fn test_env_facts_are_false_in_browser() {
        let mut host = StaticHost::browser(CHROME_MAC, "MacIntel")
            .with_env("CI", "true")
            .with_env("NODE_ENV", "production")
            .with_env("DEBUG", "1")
            .with_file("/.dockerenv", "");
        host.env.insert("GITHUB_ACTIONS".to_owned(), "true".to_owned());
        let facts = detect_facts(&host);

        assert!(!facts.ci());
        assert!(!facts.production());
        assert!(!facts.development());
        assert!(!facts.debug());
        assert!(!facts.github_actions());
        assert!(!facts.containerized());
    }

    #[test]
    fn test_ci_iff_any_signal() {
        assert!(!detect_facts(&StaticHost::node("v20.11.1")).ci());
        for name in checks::CI_VARIABLES {
            let facts = detect_facts(&StaticHost::node("v20.11.1").with_env(name, "true"));
            assert!(facts.ci(), "{name}");
        }
        let all = checks::CI_VARIABLES
            .iter()
            .fold(StaticHost::node("v20.11.1"), |host, name| host.with_env(name, "1"));
        assert!(detect_facts(&all).ci());
    }

    #[test]
    fn test_build_number_zero_is_ci() {
        let build = detect_facts(&StaticHost::node("v20.11.1").with_env("BUILD_NUMBER", "0"));
        let run = detect_facts(&StaticHost::node("v20.11.1").with_env("RUN_ID", "0"));
        assert!(build.ci());
        assert!(run.ci());
    }

    #[test]
    fn test_vendor_ci_facts() {
        let facts = detect_facts(
            &StaticHost::node("v20.11.1")
                .with_env("GITHUB_ACTIONS", "true")
                .with_env("GITLAB_CI", "true")
                .with_env("VERCEL", "1"),
        );
        assert!(facts.github_actions());
        assert!(facts.gitlab());
        assert!(facts.vercel());
        assert!(!facts.netlify());
        assert!(!facts.circle_ci());
        // vendor variables alone do not make `ci`
        assert!(!facts.ci());
    }

    #[test]
    fn test_debug_variables() {
        assert!(detect_facts(&StaticHost::node("v20.11.1").with_env("DEBUG", "app:*")).debug());
        assert!(detect_facts(&StaticHost::node("v20.11.1").with_env("DEBUG_MODE", "true")).debug());
        assert!(!detect_facts(&StaticHost::node("v20.11.1").with_env("DEBUG", "")).debug());
    }

    #[test]
    fn test_containerized() {
        let marker = StaticHost::node("v20.11.1").with_file("/.dockerenv", "");
        let cgroup = StaticHost::node("v20.11.1")
            .with_file(checks::CGROUP_PATH, "12:memory:/docker/3f2a\n");
        let unreadable = StaticHost::node("v20.11.1").with_unreadable_file(checks::CGROUP_PATH);

        assert!(detect_facts(&marker).containerized());
        assert!(detect_facts(&cgroup).containerized());
        assert!(!detect_facts(&unreadable).containerized());
    }

    #[test]
    fn test_containerized_without_filesystem_api() {
        init_logger();
        let host = StaticHost::node("v20.11.1").without_filesystem();
        assert!(!detect_container(host.filesystem()));
        assert!(!detect_facts(&host).containerized());
        assert!(!detect_facts(&host).wsl());
    }

    #[test]
    fn test_iframe() {
        let framed = StaticHost::browser(CHROME_MAC, "MacIntel").with_framed(Some(true));
        let cross_origin = StaticHost::browser(CHROME_MAC, "MacIntel").with_framed(None);

        assert!(detect_facts(&framed).iframe());
        assert!(!detect_facts(&cross_origin).iframe());
    }

    #[test]
    fn test_worker_and_alternate_runtimes() {
        let worker = detect_facts(&StaticHost::web_worker(CHROME_MAC, "MacIntel"));
        assert!(worker.web_worker());
        assert!(!worker.browser());
        // vendor facts follow `browser`
        assert!(!worker.chrome());

        let deno = detect_facts(&StaticHost::deno("1.45.2"));
        assert!(deno.deno());
        assert!(!deno.node());
        assert!(!deno.development());

        let bun = detect_facts(&StaticHost::bun("1.1.20"));
        assert!(bun.bun());
        assert!(bun.node());
    }

    #[test]
    fn test_electron_and_platforms() {
        let electron = detect_facts(
            &StaticHost::node("v20.11.1")
                .with_process_version("electron", "31.2.0")
                .with_platform("win32"),
        );
        assert!(electron.electron());
        assert!(electron.windows());
        assert!(!electron.linux());
    }

    #[test]
    fn test_contradictory_host_is_not_corrected() {
        let mut host = StaticHost::browser(CHROME_MAC, "MacIntel")
            .with_global(Global::Process)
            .with_global(Global::Deno);
        host.process = StaticHost::node("v20.11.1").process;
        let facts = detect_facts(&host);

        assert!(facts.browser());
        assert!(facts.node());
        assert!(facts.deno());
    }

    #[test]
    fn test_vendor_facts_exactly_one_per_sample() {
        for (ua, platform, expected) in samples::USER_AGENTS {
            let facts = detect_facts(&StaticHost::browser(ua, platform));
            let set: Vec<_> = [Fact::Chrome, Fact::Firefox, Fact::Safari, Fact::Edge]
                .into_iter()
                .filter(|fact| facts.get(*fact))
                .collect();

            assert_eq!(set, vec![Fact::from(*expected)], "user agent: {ua}");
            assert_eq!(facts.browser_vendor(), Some(*expected));
        }
    }

    #[test]
    fn test_web_socket_is_evaluated_per_call() {
        let mut host = StaticHost::browser(CHROME_MAC, "MacIntel")
            .with_capability(Capability::WebGl, true);
        let before = detect_facts(&host);
        assert!(!web_socket(&host));

        host.install_global(Global::WebSocket);
        assert!(web_socket(&host));
        assert_eq!(detect_facts(&host), before);
    }
}
