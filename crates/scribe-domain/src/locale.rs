//! Interface locales.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A locale the application ships translations for.
///
/// Wire format: lowercase two-letter language tag (`"en"`, `"de"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
    Es,
    Fr,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale: {0}")]
pub struct UnsupportedLocale(pub String);

impl Locale {
    pub const ALL: [Locale; 4] = [Locale::En, Locale::De, Locale::Es, Locale::Fr];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Es => "es",
            Self::Fr => "fr",
        }
    }

    /// Parse a stored tag, falling back to the default locale for tags that
    /// are no longer supported.
    pub fn from_tag_or_default(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    /// Accepts region-qualified tags (`fr-CA`, `en_US`) by their language part.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lang = s
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == lang)
            .ok_or_else(|| UnsupportedLocale(s.to_owned()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
