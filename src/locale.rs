use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the app ships translations for. The backend tags guidance with
/// the same codes, so this set is also what outgoing requests may carry.
pub const AVAILABLE_LOCALES: &[(&str, &str)] = &[
    ("en", "English"),
    ("ha", "Hausa"),
    ("yo", "Yoruba"),
    ("ig", "Igbo"),
    ("pidgin", "Pidgin English"),
];

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageCode(String);

impl LanguageCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        AVAILABLE_LOCALES.iter().any(|(code, _)| *code == self.0)
    }

    /// Resolves a persisted code at boot. Anything outside the available
    /// set falls back to the default.
    #[must_use]
    pub fn from_persisted(stored: Option<&str>) -> Self {
        match stored {
            Some(code) if AVAILABLE_LOCALES.iter().any(|(c, _)| *c == code) => Self::new(code),
            _ => Self::default(),
        }
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub code: String,
    pub name: String,
}

#[must_use]
pub fn available_locales() -> Vec<Locale> {
    AVAILABLE_LOCALES
        .iter()
        .map(|(code, name)| Locale {
            code: (*code).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleState {
    pub current: LanguageCode,
}

impl LocaleState {
    /// Applies a language change. Unrecognized codes are applied as-is; the
    /// string lookup layer falls back per-string, so this never rejects.
    pub fn change(&mut self, code: LanguageCode) {
        self.current = code;
    }
}

impl Default for LocaleState {
    fn default() -> Self {
        Self {
            current: LanguageCode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_known_code_is_kept() {
        assert_eq!(LanguageCode::from_persisted(Some("yo")).as_str(), "yo");
    }

    #[test]
    fn persisted_unknown_code_falls_back_to_default() {
        assert_eq!(LanguageCode::from_persisted(Some("fr")).as_str(), "en");
        assert_eq!(LanguageCode::from_persisted(None).as_str(), "en");
        assert_eq!(LanguageCode::from_persisted(Some("")).as_str(), "en");
    }

    #[test]
    fn change_applies_unrecognized_codes_verbatim() {
        let mut state = LocaleState::default();
        state.change(LanguageCode::new("sw"));
        assert_eq!(state.current.as_str(), "sw");
        assert!(!state.current.is_supported());
    }

    #[test]
    fn available_set_contains_all_shipped_locales() {
        let locales = available_locales();
        assert_eq!(locales.len(), 5);
        assert!(locales.iter().any(|l| l.code == "pidgin" && l.name == "Pidgin English"));
    }
}
