use std::sync::LazyLock;

use regex::Regex;

/// Operating system families, in signature test order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
    Android,
    Ios,
}

struct Signature {
    family: OsFamily,
    platform: Regex,
    version: Option<Regex>,
}

static SIGNATURES: LazyLock<[Signature; 5]> = LazyLock::new(|| {
    let re = |pattern: &str| Regex::new(pattern).expect("valid regex");
    [
        Signature {
            family: OsFamily::Windows,
            platform: re(r"(?i)^win|windows"),
            version: Some(re(r"Windows NT ([\d.]+)")),
        },
        Signature {
            family: OsFamily::MacOs,
            platform: re(r"(?i)mac"),
            version: Some(re(r"Mac OS X ([\d_.]+)")),
        },
        Signature {
            family: OsFamily::Linux,
            platform: re(r"(?i)linux"),
            version: None,
        },
        Signature {
            family: OsFamily::Android,
            platform: re(r"(?i)android"),
            version: Some(re(r"Android ([\d.]+)")),
        },
        Signature {
            family: OsFamily::Ios,
            platform: re(r"(?i)iphone|ipad|ipod"),
            version: Some(re(r"OS ([\d_]+) like Mac OS X")),
        },
    ]
});

impl OsFamily {
    pub fn name(self) -> &'static str {
        match self {
            OsFamily::Windows => "Windows",
            OsFamily::MacOs => "macOS",
            OsFamily::Linux => "Linux",
            OsFamily::Android => "Android",
            OsFamily::Ios => "iOS",
        }
    }

    /// Matches a navigator platform string (`Win32`, `MacIntel`, `Linux x86_64`, ...).
    ///
    /// The first signature wins, so Android devices that report `Linux armv8l` come
    /// back as [`OsFamily::Linux`], and iPads that report `MacIntel` as [`OsFamily::MacOs`].
    pub fn from_navigator_platform(platform: &str) -> Option<Self> {
        SIGNATURES
            .iter()
            .find(|sig| sig.platform.is_match(platform))
            .map(|sig| sig.family)
    }

    /// Matches a Node-style `process.platform` value.
    pub fn from_process_platform(platform: &str) -> Option<Self> {
        match platform {
            "win32" | "cygwin" => Some(OsFamily::Windows),
            "darwin" => Some(OsFamily::MacOs),
            "linux" => Some(OsFamily::Linux),
            "android" => Some(OsFamily::Android),
            "ios" => Some(OsFamily::Ios),
            _ => None,
        }
    }

    /// Extracts the OS version from a user agent, with `_` separators turned into `.`.
    pub fn version_from_user_agent(self, user_agent: &str) -> Option<String> {
        SIGNATURES
            .iter()
            .find(|sig| sig.family == self)
            .and_then(|sig| sig.version.as_ref())
            .and_then(|re| re.captures(user_agent))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().replace('_', "."))
    }
}

/// Guesses the CPU architecture from the navigator strings, in Node naming.
pub fn arch_from_navigator(user_agent: &str, platform: &str) -> Option<&'static str> {
    [user_agent, platform].into_iter().find_map(|s| {
        let s = s.to_ascii_lowercase();
        if s.contains("x86_64") || s.contains("win64") || s.contains("x64") || s.contains("wow64")
        {
            Some("x64")
        } else if s.contains("arm64") || s.contains("aarch64") {
            Some("arm64")
        } else if s.contains("armv") {
            Some("arm")
        } else if s.contains("i686") || s.contains("i386") || s.contains("win32") {
            Some("ia32")
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_signatures() {
        assert_eq!(
            OsFamily::from_navigator_platform("Win32"),
            Some(OsFamily::Windows)
        );
        assert_eq!(
            OsFamily::from_navigator_platform("MacIntel"),
            Some(OsFamily::MacOs)
        );
        assert_eq!(
            OsFamily::from_navigator_platform("Linux x86_64"),
            Some(OsFamily::Linux)
        );
        assert_eq!(
            OsFamily::from_navigator_platform("Linux armv8l"),
            Some(OsFamily::Linux)
        );
        assert_eq!(
            OsFamily::from_navigator_platform("Android"),
            Some(OsFamily::Android)
        );
        assert_eq!(
            OsFamily::from_navigator_platform("iPhone"),
            Some(OsFamily::Ios)
        );
        assert_eq!(OsFamily::from_navigator_platform("PlayStation 5"), None);
        assert_eq!(OsFamily::from_navigator_platform(""), None);
    }

    #[test]
    fn test_versions() {
        let windows = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
        let mac = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15";
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15";
        let android = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";

        assert_eq!(
            OsFamily::Windows.version_from_user_agent(windows).as_deref(),
            Some("10.0")
        );
        assert_eq!(
            OsFamily::MacOs.version_from_user_agent(mac).as_deref(),
            Some("10.15.7")
        );
        assert_eq!(
            OsFamily::Ios.version_from_user_agent(iphone).as_deref(),
            Some("17.5")
        );
        assert_eq!(
            OsFamily::Android.version_from_user_agent(android).as_deref(),
            Some("14")
        );
        assert_eq!(OsFamily::Linux.version_from_user_agent(android), None);
        assert_eq!(OsFamily::Windows.version_from_user_agent(mac), None);
    }

    #[test]
    fn test_process_platform() {
        assert_eq!(
            OsFamily::from_process_platform("win32"),
            Some(OsFamily::Windows)
        );
        assert_eq!(
            OsFamily::from_process_platform("darwin"),
            Some(OsFamily::MacOs)
        );
        assert_eq!(OsFamily::from_process_platform("aix"), None);
    }

    #[test]
    fn test_arch() {
        assert_eq!(arch_from_navigator("", "Linux x86_64"), Some("x64"));
        assert_eq!(
            arch_from_navigator("Mozilla/5.0 (Windows NT 10.0; Win64; x64)", "Win32"),
            Some("x64")
        );
        assert_eq!(arch_from_navigator("", "Linux aarch64"), Some("arm64"));
        assert_eq!(arch_from_navigator("Mozilla/5.0 (Windows NT 10.0)", "Win32"), Some("ia32"));
        assert_eq!(arch_from_navigator("", "MacIntel"), None);
    }
}
