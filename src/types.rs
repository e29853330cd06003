//! Shared vocabulary: backends, categories, settings and display values

use serde::Serialize;
use std::fmt;

/// External component whose settings are managed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Compositor,
    Panel,
    Input,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Compositor => "compositor",
            Backend::Panel => "panel",
            Backend::Input => "input",
        }
    }
}

/// Command-surface category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Input,
    Effects,
    Panel,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Input, Category::Effects, Category::Panel];

    pub fn name(self) -> &'static str {
        match self {
            Category::Input => "input",
            Category::Effects => "effects",
            Category::Panel => "panel",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Heading used in aggregate status reports
    pub fn title(self) -> &'static str {
        match self {
            Category::Input => "Input (system-level, requires sudo)",
            Category::Effects => "Effects (user-level)",
            Category::Panel => "Panel (tint2)",
        }
    }

    pub fn backend(self) -> Backend {
        match self {
            Category::Input => Backend::Input,
            Category::Effects => Backend::Compositor,
            Category::Panel => Backend::Panel,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a user-facing value looks like once read back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DisplayValue {
    Toggle(bool),
    Percent(u8),
    Text(String),
    Daemon(bool),
    /// Key not found in the config file
    Unknown,
    /// Nothing configured; the device uses its own default
    Default,
}

impl DisplayValue {
    /// Whether the status line should show the setting as on
    pub fn is_active(&self) -> bool {
        match self {
            DisplayValue::Toggle(on) | DisplayValue::Daemon(on) => *on,
            DisplayValue::Percent(p) => *p < 100,
            DisplayValue::Text(_) => true,
            DisplayValue::Unknown | DisplayValue::Default => false,
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Toggle(true) => f.write_str("enabled"),
            DisplayValue::Toggle(false) => f.write_str("disabled"),
            DisplayValue::Percent(p) => write!(f, "{p}%"),
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::Daemon(true) => f.write_str("running"),
            DisplayValue::Daemon(false) => f.write_str("stopped"),
            DisplayValue::Unknown => f.write_str("unknown"),
            DisplayValue::Default => f.write_str("default"),
        }
    }
}
