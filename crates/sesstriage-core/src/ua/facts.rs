use serde::{Deserialize, Serialize};

/// Coarse traffic class derived from a user agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Browser,
    Crawler,
    /// Link-preview fetchers of chat apps.
    Preview,
    Bot,
    #[default]
    Other,
    /// The session carried no usable user agent.
    #[serde(rename = "none")]
    Missing,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Browser,
        Category::Crawler,
        Category::Preview,
        Category::Bot,
        Category::Other,
        Category::Missing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Browser => "browser",
            Category::Crawler => "crawler",
            Category::Preview => "preview",
            Category::Bot => "bot",
            Category::Other => "other",
            Category::Missing => "none",
        }
    }

    /// Crawlers and preview fetchers are folded by identity alone.
    pub fn is_crawler_like(&self) -> bool {
        matches!(self, Category::Crawler | Category::Preview)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Smartphone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    Linux,
    Android,
    Macos,
    Ios,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "type")]
    pub kind: Option<DeviceType>,
    pub brand: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub mobile: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Os {
    pub family: Option<OsFamily>,
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Browser {
    pub name: Option<String>,
    /// Major version only.
    pub version: Option<String>,
    pub fullversion: Option<String>,
    pub engine: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    pub name: Option<String>,
    pub version: Option<String>,
    pub libname: Option<String>,
    pub libversion: Option<String>,
}

/// Everything the classifier knows about a user agent. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UaFacts {
    pub category: Category,
    pub device: Device,
    pub os: Os,
    pub browser: Browser,
    pub software: Software,
}

impl UaFacts {
    pub(crate) fn with_category(category: Category) -> Self {
        Self {
            category,
            ..Default::default()
        }
    }

    /// Best short label for the client: browser name, else software name.
    pub fn client_label(&self) -> Option<String> {
        let (name, version) = match (&self.browser.name, &self.software.name) {
            (Some(name), _) => (name, &self.browser.version),
            (None, Some(name)) => (name, &self.software.version),
            (None, None) => return None,
        };
        Some(match version {
            Some(v) => format!("{} {}", name, v),
            None => name.clone(),
        })
    }

    /// OS name with version when known.
    pub fn os_label(&self) -> Option<String> {
        let name = self.os.name.as_ref()?;
        Some(match &self.os.version {
            Some(v) => format!("{} {}", name, v),
            None => name.clone(),
        })
    }
}
