//! Heuristics over the `;`-separated tokens of one parenthesized UA group.

use std::sync::LazyLock;

use regex::Regex;

use super::facts::{Category, DeviceType, Os, OsFamily, UaFacts};

static MACOS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Mac OS X (\d+)_(\d+)_(\d+)").unwrap());
static IOS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"iPhone OS (\d+)_(\d+)").unwrap());

/// Software names in a `compatible` group that identify search crawlers.
const CRAWLERS: [&str; 4] = [
    "Googlebot",
    "DuckDuckGo-Favicons-Bot",
    "Baiduspider",
    "CensysInspect",
];

/// Software names in a `compatible` group that identify link-preview fetchers.
const PREVIEWERS: [&str; 1] = ["Discordbot"];

/// Map a Windows platform token to its marketing version.
pub(crate) fn windows_version(token: &str) -> Option<&'static str> {
    let version = match token {
        "Windows ME" => "ME",
        "Win16" => "3.11",
        "Windows 95" | "Win95" | "Windows_95" => "95",
        "Windows 98" | "Win98" => "98",
        "Windows NT 5.0" | "Windows 2000" => "2000",
        "Windows NT 5.1" | "Windows XP" => "XP",
        "Windows NT 5.2" => "Server 2003",
        "Windows NT 6.0" => "Vista",
        "Windows NT 6.1" => "7",
        "Windows NT 6.2" | "Windows NT 6.3" => "8",
        "Windows NT 10.0" => "10",
        _ => return None,
    };
    Some(version)
}

/// Split a parenthesized group into trimmed tokens.
pub(crate) fn tokenize(group: &str) -> Vec<&str> {
    group.split(';').map(str::trim).collect()
}

/// Apply one group's tokens to `facts`. Every field a branch touches is overwritten,
/// so a later group wins over an earlier one.
pub(crate) fn apply_group(tokens: &[&str], facts: &mut UaFacts) {
    let Some(&raw_first) = tokens.first() else {
        return;
    };

    // A bare "Windows" is refined by a more specific sibling such as "Windows NT 10.0".
    let first = if raw_first == "Windows" {
        tokens
            .iter()
            .copied()
            .find(|t| *t != "Windows" && t.starts_with("Windows"))
            .unwrap_or(raw_first)
    } else {
        raw_first
    };

    if first.starts_with("Windows") {
        set_desktop(facts);
        facts.os.family = Some(OsFamily::Windows);
        set_windows_name(&mut facts.os, Some(first));
    } else if first == "X11" {
        set_desktop(facts);
        facts.os.family = Some(OsFamily::Linux);
        if tokens.contains(&"Ubuntu") {
            facts.os.name = Some("Ubuntu".to_string());
        } else if tokens.contains(&"Fedora") {
            facts.os.name = Some("Fedora".to_string());
        }
    } else if first == "Linux" {
        let android = [1, 2]
            .into_iter()
            .filter_map(|i| tokens.get(i).copied())
            .find(|t| t.starts_with("Android"));
        if let Some(token) = android {
            set_android(token, facts);
        }
    } else if first.starts_with("Android") {
        set_android(first, facts);
    } else if first == "Macintosh" {
        set_desktop(facts);
        facts.os.family = Some(OsFamily::Macos);
        facts.os.name = Some("macOS".to_string());
        facts.os.version = tokens
            .iter()
            .find_map(|t| MACOS_PATTERN.captures(t))
            .map(|c| format!("{}.{}", &c[1], &c[2]));
    } else if first == "iPhone" {
        facts.device.kind = Some(DeviceType::Smartphone);
        facts.device.mobile = Some(true);
        facts.os.family = Some(OsFamily::Ios);
        facts.os.name = Some("iOS".to_string());
        facts.os.version = tokens
            .iter()
            .find_map(|t| IOS_PATTERN.captures(t))
            .map(|c| c[1].to_string());
    } else if first == "compatible" {
        apply_compatible(tokens, facts);
    }
}

/// Internet Explorer hints that only make sense once the OS is known to be Windows.
pub(crate) fn apply_windows_browser_hints(tokens: &[&str], facts: &mut UaFacts) {
    if facts.os.family != Some(OsFamily::Windows) {
        return;
    }
    for token in tokens {
        if token.starts_with("Trident/") {
            facts.browser.name = Some("Internet Explorer".to_string());
            facts.browser.engine = Some("trident".to_string());
        } else if let Some(rv) = token.strip_prefix("rv:") {
            facts.browser.version = non_empty(major(rv));
            facts.browser.fullversion = non_empty(rv);
        }
    }
}

fn apply_compatible(tokens: &[&str], facts: &mut UaFacts) {
    match tokens.get(1).copied() {
        Some(token) if token.starts_with("MSIE ") => {
            set_desktop(facts);
            facts.os.family = Some(OsFamily::Windows);
            set_windows_name(&mut facts.os, tokens.get(2).copied());
            let version = &token["MSIE ".len()..];
            facts.browser.name = Some("Internet Explorer".to_string());
            facts.browser.version = non_empty(major(version));
            facts.browser.fullversion = non_empty(version);
        }
        Some(token) => match token.split_once('/') {
            Some((name, version)) => {
                facts.software.name = Some(name.to_string());
                facts.software.version = Some(version.to_string());
            }
            None => facts.software.name = Some(token.to_string()),
        },
        None => {}
    }

    facts.category = match facts.software.name.as_deref() {
        Some(name) if CRAWLERS.contains(&name) => Category::Crawler,
        Some(name) if name.to_lowercase().contains("crawler") => Category::Crawler,
        Some(name) if PREVIEWERS.contains(&name) => Category::Preview,
        _ => Category::Bot,
    };
}

/// Known tokens map to `Windows <version>`; anything else keeps the raw token as the name.
fn set_windows_name(os: &mut Os, token: Option<&str>) {
    let Some(token) = token else {
        return;
    };
    match windows_version(token) {
        Some(version) => {
            os.name = Some("Windows".to_string());
            os.version = Some(version.to_string());
        }
        None => os.name = Some(token.to_string()),
    }
}

fn set_android(token: &str, facts: &mut UaFacts) {
    facts.device.kind = Some(DeviceType::Smartphone);
    facts.device.mobile = Some(true);
    facts.os.family = Some(OsFamily::Android);
    facts.os.name = Some("Android".to_string());
    // "Android 13.1" -> "13"
    facts.os.version = non_empty(major(token.get(8..).unwrap_or("")));
}

fn set_desktop(facts: &mut UaFacts) {
    facts.device.kind = Some(DeviceType::Desktop);
    facts.device.mobile = Some(false);
}

/// Text up to the first `.`.
pub(crate) fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
