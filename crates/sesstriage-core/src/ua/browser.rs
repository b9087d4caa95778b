//! Browser detection from the `Name/1.2.3` product tokens outside parentheses.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::facts::Browser;

static PRODUCT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9]+)/((\d+)(?:\.\d+)+)").unwrap());
static GROUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?\)").unwrap());

#[derive(Debug, Clone)]
struct Product {
    version: String,
    fullversion: String,
}

/// Resolve the browser from the product tokens of `ua` and write it into `browser`.
/// Leaves `browser` untouched when nothing resolves.
pub(crate) fn apply_products(ua: &str, browser: &mut Browser) {
    let stripped = GROUP_PATTERN.replace_all(ua, "");

    let mut products: HashMap<&str, Product> = HashMap::new();
    let mut last: Option<&str> = None;

    // The first product is the `Mozilla/x.y` marker.
    for caps in PRODUCT_PATTERN.captures_iter(&stripped).skip(1) {
        let (Some(name), Some(full), Some(major)) = (caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };
        products.insert(
            name.as_str(),
            Product {
                version: major.as_str().to_string(),
                fullversion: full.as_str().to_string(),
            },
        );
        last = Some(name.as_str());
    }

    let has = |name: &str| products.contains_key(name);

    let (mut name, mut source) = if has("Safari") && !has("Chrome") && !has("CrMo") {
        if has("Version") {
            (Some("Safari"), Some("Version"))
        } else {
            (None, None)
        }
    } else if has("Chrome") {
        (Some("Chrome"), Some("Chrome"))
    } else if has("CrMo") {
        (Some("Chrome"), Some("CrMo"))
    } else {
        (last, last)
    };

    // Chromium derivatives append their own token after Chrome/Safari.
    if name == Some("Chrome") && !matches!(last, Some("Chrome") | Some("Safari")) {
        source = last;
        name = match last {
            Some("Edge") | Some("Edg") => Some("Edge"),
            Some("OPR") => Some("Opera"),
            other => other,
        };
    }

    let (Some(name), Some(product)) = (name, source.and_then(|s| products.get(s))) else {
        return;
    };
    browser.name = Some(name.to_string());
    browser.version = Some(product.version.clone());
    browser.fullversion = Some(product.fullversion.clone());
}
