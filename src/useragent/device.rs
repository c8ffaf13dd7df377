use std::sync::LazyLock;

use regex::Regex;

/// Vendor and model of a browser-like device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor: String,
    pub model: String,
}

impl DeviceIdentity {
    fn new(vendor: &str, model: &str) -> Self {
        Self {
            vendor: vendor.to_owned(),
            model: model.to_owned(),
        }
    }

    pub fn unknown() -> Self {
        Self::new("unknown", "unknown")
    }
}

static PAREN_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("valid regex"));

/// Android model prefixes and their vendors.
const ANDROID_VENDORS: &[(&str, &str)] = &[
    ("SM-", "Samsung"),
    ("GT-", "Samsung"),
    ("Pixel", "Google"),
    ("Nexus", "Google"),
    ("moto", "Motorola"),
    ("Redmi", "Xiaomi"),
    ("Mi ", "Xiaomi"),
    ("ONEPLUS", "OnePlus"),
    ("HUAWEI", "Huawei"),
];

/// Reads vendor and model out of the first parenthesised clause of a user agent.
///
/// Checks `iPhone`, `iPad` and `Android` in that order. Android models come from the
/// clause segment after the `Android x` segment.
pub fn identify_device(user_agent: &str) -> DeviceIdentity {
    let Some(clause) = PAREN_CLAUSE
        .captures(user_agent)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        return DeviceIdentity::unknown();
    };

    if clause.contains("iPhone") {
        return DeviceIdentity::new("Apple", "iPhone");
    }
    if clause.contains("iPad") {
        return DeviceIdentity::new("Apple", "iPad");
    }
    if clause.contains("Android") {
        return identify_android(clause);
    }

    DeviceIdentity::unknown()
}

fn identify_android(clause: &str) -> DeviceIdentity {
    let mut segments = clause.split(';').map(str::trim);
    let model = segments
        .by_ref()
        .find(|segment| segment.starts_with("Android"))
        .and_then(|_| segments.next())
        .map(|segment| match segment.split_once(" Build/") {
            Some((model, _)) => model.trim(),
            None => segment,
        })
        .filter(|model| !model.is_empty());

    let Some(model) = model else {
        return DeviceIdentity::unknown();
    };

    let vendor = ANDROID_VENDORS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, vendor)| *vendor)
        .unwrap_or("unknown");

    DeviceIdentity::new(vendor, model)
}
