//! Multi-locale display text.
//!
//! Titles are stored as an ordered list of `{key, value}` pairs. Older
//! payloads send a bare string; those are accepted and normalized to a
//! single entry under [`DEFAULT_LOCALE`].

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(alias = "languageKey")]
    pub key: String,
    #[serde(alias = "text")]
    pub value: String,
}

impl LocalizedText {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Plain(String),
    Localized(Vec<LocalizedText>),
}

/// Accepts either a plain string or a list of localized entries.
pub fn deserialize_localized<'de, D>(deserializer: D) -> Result<Vec<LocalizedText>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextRepr::deserialize(deserializer)? {
        TextRepr::Plain(text) if text.is_empty() => Vec::new(),
        TextRepr::Plain(text) => vec![LocalizedText::new(DEFAULT_LOCALE, text)],
        TextRepr::Localized(entries) => entries,
    })
}

/// Pick the text for `locale`, falling back to the first entry.
pub fn resolve<'a>(entries: &'a [LocalizedText], locale: Option<&str>) -> &'a str {
    locale
        .and_then(|l| entries.iter().find(|e| e.key.eq_ignore_ascii_case(l)))
        .or_else(|| entries.first())
        .map(|e| e.value.as_str())
        .unwrap_or("")
}
