//! User-agent classification.
//!
//! [`classify`] is a pure function from a raw user-agent string to [`UaFacts`].
//! `Mozilla/` agents go through the platform and product-token heuristics;
//! a fixed set of well-known tool prefixes is recognised literally; anything
//! else is [`Category::Other`].

mod browser;
mod facts;
mod platform;

pub use facts::{Browser, Category, Device, DeviceType, Os, OsFamily, Software, UaFacts};

use tracing::trace;

/// Classify a user agent. `None` stands for a missing or non-string agent.
pub fn classify(ua: Option<&str>) -> UaFacts {
    let Some(ua) = ua else {
        return UaFacts::with_category(Category::Missing);
    };

    let mut facts = if ua.starts_with("Mozilla/") {
        classify_mozilla(ua)
    } else {
        classify_software(ua)
    };

    // An empty version is never a valid answer.
    if facts.software.version.as_deref() == Some("") {
        facts.software.version = None;
    }
    if facts.software.libversion.as_deref() == Some("") {
        facts.software.libversion = None;
    }

    trace!(ua, category = %facts.category, "Classified user agent");
    facts
}

fn classify_mozilla(ua: &str) -> UaFacts {
    let mut facts = UaFacts::with_category(Category::Browser);

    let mut all_tokens = Vec::new();
    for group in parenthesized_groups(ua) {
        let tokens = platform::tokenize(group);
        platform::apply_group(&tokens, &mut facts);
        all_tokens.extend(tokens);
    }
    platform::apply_windows_browser_hints(&all_tokens, &mut facts);

    browser::apply_products(ua, &mut facts.browser);
    facts
}

/// Contents of each `(...)` group, left to right. An unclosed group runs to the end.
fn parenthesized_groups(ua: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = ua;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        match after.find(')') {
            Some(close) => {
                groups.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => {
                groups.push(after);
                break;
            }
        }
    }
    groups
}

/// Non-browser agents recognised by a literal prefix.
fn classify_software(ua: &str) -> UaFacts {
    let mut category = Category::Other;
    let mut sw = Software::default();

    if let Some(rest) = ua.strip_prefix("Lynx/") {
        sw.name = Some("Lynx".into());
        sw.version = Some(first_word(rest).into());
    } else if let Some(rest) = ua.strip_prefix("Python-urllib/") {
        sw.name = Some("Python".into());
        sw.libname = Some("urllib".into());
        sw.libversion = Some(rest.into());
    } else if let Some(rest) = ua.strip_prefix("Python/") {
        // "Python/3.11 aiohttp/3.8.5"
        sw.name = Some("Python".into());
        match rest.split_once(' ') {
            Some((version, lib)) => {
                sw.version = Some(version.into());
                match lib.split_once('/') {
                    Some((libname, libversion)) => {
                        sw.libname = Some(libname.into());
                        sw.libversion = Some(libversion.into());
                    }
                    None => sw.libname = Some(lib.into()),
                }
            }
            None => sw.version = Some(rest.into()),
        }
    } else if let Some(rest) = ua.strip_prefix("WhatsApp/") {
        category = Category::Preview;
        sw.name = Some("WhatsApp".into());
        sw.version = Some(first_word(rest).into());
    } else if ua.starts_with("TelegramBot") {
        category = Category::Preview;
        sw.name = Some("TelegramBot".into());
    } else if let Some(rest) = ua.strip_prefix("curl/") {
        sw.name = Some("curl".into());
        sw.version = Some(rest.into());
    } else if let Some(rest) = ua.strip_prefix("libwww-perl/") {
        sw.name = Some("perl".into());
        sw.libname = Some("libwww".into());
        sw.libversion = Some(rest.into());
    } else if let Some(rest) = ua.strip_prefix("python-requests") {
        sw.name = Some("Python".into());
        sw.libname = Some("requests".into());
        sw.libversion = Some(rest.strip_prefix('/').unwrap_or(rest).into());
    } else if let Some(rest) = ua.strip_prefix("Go-http-client/") {
        sw.name = Some("Go".into());
        sw.libname = Some("http-client".into());
        sw.libversion = Some(rest.into());
    } else if let Some(rest) = ua.strip_prefix("Googlebot-Image/") {
        category = Category::Crawler;
        sw.name = Some("Googlebot-Image".into());
        sw.version = Some(rest.into());
    } else if ua == "Go http package" {
        sw.name = Some("Go".into());
        sw.libname = Some("http package".into());
    } else if ua == "Microsoft Windows Network Diagnostics" {
        sw.name = Some(ua.into());
    } else if let Some(rest) = ua.strip_prefix("Java/") {
        // "Java/1.8.0_292" -> "1.8.0"
        sw.name = Some("Java".into());
        sw.version = Some(rest.split('_').next().unwrap_or(rest).into());
    }

    UaFacts {
        category,
        software: sw,
        ..Default::default()
    }
}

fn first_word(s: &str) -> &str {
    s.split(' ').next().unwrap_or(s)
}
