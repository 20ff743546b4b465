//! Session configuration.
//!
//! Where drafts are written and which default message catalogue to use.
//! Defaults suit a local working directory; override via environment
//! variables or explicit construction for tests.

use std::path::PathBuf;

use formstage_schema::{Locale, MessageCatalog};

/// Default directory for file-backed drafts.
pub const DEFAULT_DRAFT_DIR: &str = ".formstage/drafts";

/// Configuration for a [`FormSession`](crate::FormSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory holding one `<key>.json` file per draft.
    pub draft_dir: PathBuf,
    /// Language of the default validation messages.
    pub locale: Locale,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            draft_dir: PathBuf::from(DEFAULT_DRAFT_DIR),
            locale: Locale::default(),
        }
    }
}

impl SessionConfig {
    /// Explicit configuration.
    pub fn new(draft_dir: impl Into<PathBuf>, locale: Locale) -> Self {
        Self {
            draft_dir: draft_dir.into(),
            locale,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `FORMSTAGE_DRAFT_DIR` (default: `.formstage/drafts`)
    /// - `FORMSTAGE_LOCALE` (default: `en`; `en` or `he`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let draft_dir = match lookup("FORMSTAGE_DRAFT_DIR") {
            Some(dir) if dir.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    var: "FORMSTAGE_DRAFT_DIR".into(),
                    reason: "must not be empty".into(),
                })
            }
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(DEFAULT_DRAFT_DIR),
        };
        let locale = match lookup("FORMSTAGE_LOCALE") {
            Some(raw) => raw.parse::<Locale>().map_err(|reason| ConfigError::Invalid {
                var: "FORMSTAGE_LOCALE".into(),
                reason,
            })?,
            None => Locale::default(),
        };
        Ok(Self { draft_dir, locale })
    }

    /// The built-in catalogue for the configured locale.
    pub fn catalog(&self) -> MessageCatalog {
        MessageCatalog::for_locale(self.locale)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = SessionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, SessionConfig::default());
        assert_eq!(cfg.draft_dir, PathBuf::from(".formstage/drafts"));
    }

    #[test]
    fn test_overrides_are_read() {
        let cfg = SessionConfig::from_lookup(lookup(&[
            ("FORMSTAGE_DRAFT_DIR", "/tmp/drafts"),
            ("FORMSTAGE_LOCALE", "he"),
        ]))
        .unwrap();
        assert_eq!(cfg.draft_dir, PathBuf::from("/tmp/drafts"));
        assert_eq!(cfg.locale, Locale::He);
        assert_eq!(cfg.catalog(), MessageCatalog::hebrew());
    }

    #[test]
    fn test_bad_locale_is_rejected() {
        let err = SessionConfig::from_lookup(lookup(&[("FORMSTAGE_LOCALE", "klingon")])).unwrap_err();
        assert!(err.to_string().contains("FORMSTAGE_LOCALE"));
    }

    #[test]
    fn test_empty_draft_dir_is_rejected() {
        assert!(SessionConfig::from_lookup(lookup(&[("FORMSTAGE_DRAFT_DIR", " ")])).is_err());
    }
}
