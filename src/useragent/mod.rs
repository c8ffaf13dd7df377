//! User-agent heuristics.
//!
//! Substring and regular expression tests over the navigator strings. This is not a
//! user-agent parser and misclassifies some agents on purpose: Chromium forks and
//! embedded webviews report as Chrome, and every vendor check follows one fixed
//! precedence order ([`BrowserVendor::PRECEDENCE`]) so that exactly one vendor wins.
mod device;
mod os;

pub use device::{DeviceIdentity, identify_device};
pub use os::{OsFamily, arch_from_navigator};

use std::sync::LazyLock;

use regex::Regex;

/// Browser vendors that can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserVendor {
    Edge,
    Chrome,
    Firefox,
    Safari,
}

static EDGE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Edg(?:e|A|iOS)?/([\d.]+)").expect("valid regex"));
static CHROME_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Chrome|CriOS)/([\d.]+)").expect("valid regex"));
static FIREFOX_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Firefox|FxiOS)/([\d.]+)").expect("valid regex"));
static SAFARI_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version/([\d.]+)").expect("valid regex"));

static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Mobi|Android|iPhone|iPod").expect("valid regex"));
static TABLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Tablet|iPad").expect("valid regex"));

impl BrowserVendor {
    /// Tie-break order. Edge agents also carry `Chrome`, and Chrome agents also carry
    /// `Safari`, so earlier entries shadow later ones.
    pub const PRECEDENCE: [BrowserVendor; 4] = [
        BrowserVendor::Edge,
        BrowserVendor::Chrome,
        BrowserVendor::Firefox,
        BrowserVendor::Safari,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BrowserVendor::Edge => "Edge",
            BrowserVendor::Chrome => "Chrome",
            BrowserVendor::Firefox => "Firefox",
            BrowserVendor::Safari => "Safari",
        }
    }

    /// Rendering engine name.
    pub fn engine(self) -> &'static str {
        match self {
            BrowserVendor::Edge | BrowserVendor::Chrome => "Blink",
            BrowserVendor::Firefox => "Gecko",
            BrowserVendor::Safari => "WebKit",
        }
    }

    /// Raw signature test, without precedence.
    fn signature_matches(self, user_agent: &str) -> bool {
        match self {
            BrowserVendor::Edge => user_agent.contains("Edg"),
            BrowserVendor::Chrome => {
                user_agent.contains("Chrome") || user_agent.contains("CriOS")
            }
            BrowserVendor::Firefox => {
                user_agent.contains("Firefox") || user_agent.contains("FxiOS")
            }
            BrowserVendor::Safari => {
                user_agent.contains("Safari")
                    && !user_agent.contains("Chrome")
                    && !user_agent.contains("Chromium")
            }
        }
    }

    /// Extracts the browser version from the user agent.
    pub fn version(self, user_agent: &str) -> Option<String> {
        let re = match self {
            BrowserVendor::Edge => &EDGE_VERSION,
            BrowserVendor::Chrome => &CHROME_VERSION,
            BrowserVendor::Firefox => &FIREFOX_VERSION,
            BrowserVendor::Safari => &SAFARI_VERSION,
        };
        re.captures(user_agent)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned())
    }
}

/// Returns the vendor that wins under [`BrowserVendor::PRECEDENCE`], if any.
pub fn classify_vendor(user_agent: &str) -> Option<BrowserVendor> {
    BrowserVendor::PRECEDENCE
        .into_iter()
        .find(|vendor| vendor.signature_matches(user_agent))
}

pub fn is_mobile(user_agent: &str) -> bool {
    MOBILE.is_match(user_agent)
}

pub fn is_tablet(user_agent: &str) -> bool {
    TABLET.is_match(user_agent)
}

/// Device class of a browser-like host; mobile shadows tablet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn from_flags(mobile: bool, tablet: bool) -> Self {
        if mobile {
            DeviceClass::Mobile
        } else if tablet {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }
}
