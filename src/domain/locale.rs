//! Locale override domain model.
//!
//! A [`LocaleOverride`] is the ordered list of display languages forced on a
//! single application. An empty list means no override is set and the
//! application follows the system language.
//!
//! Stored entries use a compact `"<display name>,<language tag>"` encoding. The
//! tag never contains a comma but display names can ("Portuguese, Brazil"), so
//! decoding splits on the last comma only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One language in an override list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocaleEntry {
    /// Human-readable language name, e.g. `Portuguese, Brazil`.
    pub name: String,
    /// BCP-47 language tag, e.g. `pt-BR`.
    pub language_tag: String,
}

impl LocaleEntry {
    pub fn new(name: impl Into<String>, language_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language_tag: language_tag.into(),
        }
    }

    /// Creates an entry whose display name is the tag itself.
    ///
    /// Channels that only report tags (the root shell does) use this.
    pub fn from_tag(language_tag: impl Into<String>) -> Self {
        let tag = language_tag.into();
        Self {
            name: tag.clone(),
            language_tag: tag,
        }
    }

    /// Decodes a stored `"<name>,<tag>"` entry.
    ///
    /// Splits on the last comma so names that contain commas survive. An
    /// entry without a comma is treated as a bare tag. Returns `None` for blank
    /// input.
    ///
    /// # Examples
    ///
    /// ```
    /// use applang::domain::LocaleEntry;
    ///
    /// let entry = LocaleEntry::decode("Portuguese, Brazil,pt-BR").unwrap();
    /// assert_eq!(entry.name, "Portuguese, Brazil");
    /// assert_eq!(entry.language_tag, "pt-BR");
    /// ```
    #[must_use]
    pub fn decode(encoded: &str) -> Option<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return None;
        }
        match encoded.rsplit_once(',') {
            Some((name, tag)) if !tag.trim().is_empty() => {
                Some(Self::new(name.trim(), tag.trim()))
            }
            Some((name, _)) => Some(Self::from_tag(name.trim())),
            None => Some(Self::from_tag(encoded)),
        }
    }

    /// Encodes the entry as `"<name>,<tag>"`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{},{}", self.name, self.language_tag)
    }
}

/// The ordered locale override for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleOverride(Vec<LocaleEntry>);

impl LocaleOverride {
    /// An empty override ("follow the system language").
    #[must_use]
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub const fn new(entries: Vec<LocaleEntry>) -> Self {
        Self(entries)
    }

    /// Builds an override from bare language tags.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tags.into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty())
                .map(LocaleEntry::from_tag)
                .collect(),
        )
    }

    /// Parses a comma-separated tag list such as `en-US,fr`.
    #[must_use]
    pub fn parse_tag_list(list: &str) -> Self {
        Self::from_tags(list.split(','))
    }

    /// Decodes a collection of stored `"<name>,<tag>"` entries, skipping blanks.
    pub fn decode_entries<I, S>(encoded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            encoded
                .into_iter()
                .filter_map(|e| LocaleEntry::decode(e.as_ref()))
                .collect(),
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[LocaleEntry] {
        &self.0
    }

    /// Joins the language tags with commas, the form both channels accept.
    ///
    /// # Examples
    ///
    /// ```
    /// use applang::domain::LocaleOverride;
    ///
    /// let locales = LocaleOverride::from_tags(["pt-BR", "en"]);
    /// assert_eq!(locales.language_tags(), "pt-BR,en");
    /// assert_eq!(LocaleOverride::none().language_tags(), "");
    /// ```
    #[must_use]
    pub fn language_tags(&self) -> String {
        self.0
            .iter()
            .map(|e| e.language_tag.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for LocaleOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(system default)");
        }
        let names: Vec<String> = self
            .0
            .iter()
            .map(|e| {
                if e.name == e.language_tag {
                    e.language_tag.clone()
                } else {
                    format!("{} [{}]", e.name, e.language_tag)
                }
            })
            .collect();
        f.write_str(&names.join(", "))
    }
}
