//! Localized UI strings. Tables are flat JSON objects mapping keys to
//! templates with `{name}` placeholders; a missing key renders as the key.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "pt"];

const BUILTIN_EN: &str = include_str!("../locales/en.json");
const BUILTIN_PT: &str = include_str!("../locales/pt.json");

#[derive(Debug, Clone, Default)]
pub struct Translations {
    language: String,
    strings: HashMap<String, String>,
}

impl Translations {
    /// Load `language` from `locales_dir`, then from the built-in tables,
    /// and finally fall back to the default language.
    pub fn load(locales_dir: &Path, language: &str) -> Self {
        if let Some(strings) = read_table(locales_dir, language) {
            return Self::from_table(language, strings);
        }
        if let Some(strings) = builtin_table(language) {
            return Self::from_table(language, strings);
        }
        if language != DEFAULT_LANGUAGE {
            warn!(language, "no translations found, falling back to the default language");
            return Self::load(locales_dir, DEFAULT_LANGUAGE);
        }
        Self::from_table(DEFAULT_LANGUAGE, HashMap::new())
    }

    fn from_table(language: &str, strings: HashMap<String, String>) -> Self {
        Self {
            language: language.to_string(),
            strings,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn t(&self, key: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Translate and substitute each `{name}` placeholder.
    pub fn t_with(&self, key: &str, vars: &[(&str, &str)]) -> String {
        let mut text = self.t(key);
        for (name, value) in vars {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

fn read_table(locales_dir: &Path, language: &str) -> Option<HashMap<String, String>> {
    let path = locales_dir.join(format!("{language}.json"));
    let contents = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(table) => {
            debug!(path = %path.display(), "loaded translations");
            Some(table)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring malformed translation file");
            None
        }
    }
}

fn builtin_table(language: &str) -> Option<HashMap<String, String>> {
    let source = match language {
        "en" => BUILTIN_EN,
        "pt" => BUILTIN_PT,
        _ => return None,
    };
    serde_json::from_str(source).ok()
}

/// Pick the start-up language: explicit choice first, then the `LANG`
/// environment prefix, then the default.
pub fn detect_language(explicit: Option<&str>, env_lang: Option<&str>) -> String {
    let candidate = explicit.or(env_lang).map(|value| {
        value
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_lowercase()
    });
    match candidate {
        Some(lang) if SUPPORTED_LANGUAGES.contains(&lang.as_str()) => lang,
        _ => DEFAULT_LANGUAGE.to_string(),
    }
}

/// Language that follows `current` in the switcher cycle.
pub fn next_language(current: &str) -> &'static str {
    let position = SUPPORTED_LANGUAGES
        .iter()
        .position(|lang| *lang == current)
        .unwrap_or(0);
    SUPPORTED_LANGUAGES[(position + 1) % SUPPORTED_LANGUAGES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_renders_the_key() {
        let translations = Translations::load(Path::new("/nonexistent"), "en");
        assert_eq!(translations.t("definitely_missing_key"), "definitely_missing_key");
    }

    #[test]
    fn builtin_tables_cover_both_languages() {
        let en = Translations::load(Path::new("/nonexistent"), "en");
        let pt = Translations::load(Path::new("/nonexistent"), "pt");
        assert_eq!(en.t("mode"), "Mode");
        assert_eq!(pt.t("mode"), "Modo");
    }

    #[test]
    fn unknown_language_falls_back_to_default() {
        let translations = Translations::load(Path::new("/nonexistent"), "xx");
        assert_eq!(translations.language(), DEFAULT_LANGUAGE);
        assert_eq!(translations.t("mode"), "Mode");
    }

    #[test]
    fn placeholders_are_substituted() {
        let translations = Translations::load(Path::new("/nonexistent"), "en");
        assert_eq!(
            translations.t_with("page_info", &[("currentPage", "2"), ("totalPages", "7")]),
            "Page 2 of 7"
        );
    }

    #[test]
    fn files_on_disk_take_priority() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.json"), r#"{"mode": "Church mode"}"#).unwrap();
        let translations = Translations::load(dir.path(), "en");
        assert_eq!(translations.t("mode"), "Church mode");
    }

    #[test]
    fn detects_language_from_environment() {
        assert_eq!(detect_language(None, Some("pt_BR.UTF-8")), "pt");
        assert_eq!(detect_language(Some("pt-BR"), Some("en_US")), "pt");
        assert_eq!(detect_language(None, Some("de_DE")), "en");
        assert_eq!(detect_language(None, None), "en");
    }

    #[test]
    fn language_switcher_cycles() {
        assert_eq!(next_language("en"), "pt");
        assert_eq!(next_language("pt"), "en");
    }
}
