use std::str::FromStr;

use crate::useragent::{BrowserVendor, OsFamily};

/// Name that is not part of the closed fact key set.
#[derive(Debug, thiserror::Error)]
#[error("unknown fact `{0}`")]
pub struct UnknownFact(pub String);

macro_rules! facts {
    ($( $(#[$doc:meta])* $variant:ident => $key:literal, $method:ident; )+) => {
        /// The closed set of fact names.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Fact {
            $( $(#[$doc])* $variant, )+
        }

        impl Fact {
            pub const ALL: &'static [Fact] = &[ $( Fact::$variant, )+ ];
            pub const COUNT: usize = Self::ALL.len();

            /// The key under which the fact is published.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Fact::$variant => $key, )+
                }
            }
        }

        impl FactTable {
            $(
                $(#[$doc])*
                pub fn $method(&self) -> bool {
                    self.get(Fact::$variant)
                }
            )+
        }
    };
}

facts! {
    /// A window with a document.
    Browser => "browser", browser;
    /// A server-like process runtime that owns environment variables.
    Node => "node", node;
    /// A dedicated worker scope with `importScripts`.
    WebWorker => "webWorker", web_worker;
    ServiceWorker => "serviceWorker", service_worker;
    Deno => "deno", deno;
    Bun => "bun", bun;
    /// A server-like runtime embedded in Electron.
    Electron => "electron", electron;
    /// Module (ESM) execution, as far as the host could tell.
    Module => "module", module;
    /// `node && !module`.
    CommonJs => "commonjs", commonjs;
    Iframe => "iframe", iframe;
    Containerized => "containerized", containerized;
    Wsl => "wsl", wsl;
    Debug => "debug", debug;
    Production => "production", production;
    /// Also the default when `NODE_ENV` is unset.
    Development => "development", development;
    Test => "test", test;
    /// Any of `CI`, `CONTINUOUS_INTEGRATION`, `BUILD_NUMBER`, `RUN_ID`.
    Ci => "ci", ci;
    GithubActions => "githubActions", github_actions;
    Gitlab => "gitlab", gitlab;
    CircleCi => "circleCI", circle_ci;
    Travis => "travis", travis;
    Jenkins => "jenkins", jenkins;
    AzurePipelines => "azurePipelines", azure_pipelines;
    Bitbucket => "bitbucket", bitbucket;
    Vercel => "vercel", vercel;
    Netlify => "netlify", netlify;
    AwsLambda => "awsLambda", aws_lambda;
    Windows => "windows", windows;
    MacOs => "macos", macos;
    Linux => "linux", linux;
    Android => "android", android;
    Ios => "ios", ios;
    Chrome => "chrome", chrome;
    Firefox => "firefox", firefox;
    Safari => "safari", safari;
    Edge => "edge", edge;
    Mobile => "mobile", mobile;
    Tablet => "tablet", tablet;
}

impl FromStr for Fact {
    type Err = UnknownFact;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fact::ALL
            .iter()
            .copied()
            .find(|fact| fact.as_str() == s)
            .ok_or_else(|| UnknownFact(s.to_owned()))
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BrowserVendor> for Fact {
    fn from(vendor: BrowserVendor) -> Self {
        match vendor {
            BrowserVendor::Edge => Fact::Edge,
            BrowserVendor::Chrome => Fact::Chrome,
            BrowserVendor::Firefox => Fact::Firefox,
            BrowserVendor::Safari => Fact::Safari,
        }
    }
}

impl From<OsFamily> for Fact {
    fn from(family: OsFamily) -> Self {
        match family {
            OsFamily::Windows => Fact::Windows,
            OsFamily::MacOs => Fact::MacOs,
            OsFamily::Linux => Fact::Linux,
            OsFamily::Android => Fact::Android,
            OsFamily::Ios => Fact::Ios,
        }
    }
}

/// Coarse runtime kind, picked by priority when several runtime facts hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeKind {
    Node,
    Browser,
    WebWorker,
    Deno,
    Bun,
    Unknown,
}

impl RuntimeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeKind::Node => "node",
            RuntimeKind::Browser => "browser",
            RuntimeKind::WebWorker => "webWorker",
            RuntimeKind::Deno => "deno",
            RuntimeKind::Bun => "bun",
            RuntimeKind::Unknown => "unknown",
        }
    }
}

/// Deployment mode taken from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Production,
    Development,
    Test,
    Unknown,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Production => "production",
            Mode::Development => "development",
            Mode::Test => "test",
            Mode::Unknown => "unknown",
        }
    }
}

/// The immutable table of facts about the host.
///
/// Built once by [`detect_facts`](super::detect_facts); there is no way to change a
/// value afterwards. Facts are readable one by one through the named accessors, by
/// [`Fact`], by key, or all at once through [`FactTable::iter`] and `Serialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactTable {
    values: [bool; Fact::COUNT],
}

impl FactTable {
    pub(super) fn new(values: [bool; Fact::COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, fact: Fact) -> bool {
        self.values[fact as usize]
    }

    /// Looks a fact up by its published key, e.g. `"webWorker"`.
    pub fn get_by_name(&self, name: &str) -> Option<bool> {
        name.parse::<Fact>().ok().map(|fact| self.get(fact))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fact, bool)> + '_ {
        Fact::ALL.iter().map(|fact| (*fact, self.get(*fact)))
    }

    /// Picks one runtime kind: server-like first, then browser-like, then alternate runtimes.
    pub fn runtime_kind(&self) -> RuntimeKind {
        if self.node() {
            RuntimeKind::Node
        } else if self.browser() {
            RuntimeKind::Browser
        } else if self.web_worker() {
            RuntimeKind::WebWorker
        } else if self.deno() {
            RuntimeKind::Deno
        } else if self.bun() {
            RuntimeKind::Bun
        } else {
            RuntimeKind::Unknown
        }
    }

    /// The vendor fact that is set, walked in [`BrowserVendor::PRECEDENCE`] order.
    pub fn browser_vendor(&self) -> Option<BrowserVendor> {
        BrowserVendor::PRECEDENCE
            .into_iter()
            .find(|vendor| self.get(Fact::from(*vendor)))
    }

    pub fn mode(&self) -> Mode {
        if self.production() {
            Mode::Production
        } else if self.development() {
            Mode::Development
        } else if self.test() {
            Mode::Test
        } else {
            Mode::Unknown
        }
    }
}

impl serde::Serialize for FactTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(Fact::COUNT))?;
        for (fact, value) in self.iter() {
            map.serialize_entry(fact.as_str(), &value)?;
        }
        map.end()
    }
}
