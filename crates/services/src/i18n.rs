//! Localized UI strings with English fallback.
//!
//! Lookup order for a dotted key such as `chat.search.placeholder`:
//! the selected language's dictionary, then the embedded English
//! dictionary, then the key itself.
//!
//! Non-English dictionaries live in `<locales_dir>/<code>.json`. A missing
//! or malformed file is logged and the English strings are used instead.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{error, info, warn};

const EMBEDDED_EN: &str = include_str!("../locales/en.json");

/// Display name and code of every supported language.
pub const LANGUAGES: [(&str, &str); 6] = [
    ("English", "en"),
    ("Hindi", "hi"),
    ("Kannada", "kn"),
    ("Bengali", "bn"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
];

pub const DEFAULT_LANGUAGE: &str = "English";

/// Languages offered in the selector, in display order.
pub fn languages() -> &'static [(&'static str, &'static str)] {
    &LANGUAGES
}

/// Code for a display name; unknown names map to English.
pub fn language_code(full_name: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|(name, _)| *name == full_name)
        .map(|(_, code)| *code)
        .unwrap_or("en")
}

fn fallback_dictionary() -> &'static Value {
    static FALLBACK: OnceLock<Value> = OnceLock::new();
    FALLBACK.get_or_init(|| {
        serde_json::from_str(EMBEDDED_EN).unwrap_or_else(|e| {
            error!("embedded English dictionary is invalid: {}", e);
            Value::Object(Default::default())
        })
    })
}

/// Where to look for `<code>.json` when nothing is configured: next to the
/// executable, then the source tree's `locales/`.
pub fn default_locales_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("locales");
            if p.is_dir() {
                return p;
            }
        }
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("locales")
}

pub struct Localizer {
    full_name: String,
    locales_dir: PathBuf,
    /// `None` means the English fallback is also the current dictionary.
    current: Option<Value>,
}

impl Localizer {
    pub fn new(full_name: impl Into<String>, locales_dir: impl Into<PathBuf>) -> Self {
        let mut localizer = Self {
            full_name: full_name.into(),
            locales_dir: locales_dir.into(),
            current: None,
        };
        localizer.reload();
        localizer
    }

    /// Build from an in-memory dictionary instead of a file.
    pub fn with_dictionary(full_name: impl Into<String>, dictionary: Value) -> Self {
        Self {
            full_name: full_name.into(),
            locales_dir: PathBuf::new(),
            current: Some(dictionary),
        }
    }

    pub fn set_language(&mut self, full_name: impl Into<String>) {
        let full_name = full_name.into();
        if full_name == self.full_name {
            return;
        }
        self.full_name = full_name;
        self.reload();
    }

    pub fn language_full_name(&self) -> &str {
        &self.full_name
    }

    pub fn language_code(&self) -> &'static str {
        language_code(&self.full_name)
    }

    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &[])
    }

    /// Resolve `key` and substitute the first `{{name}}` for each replacement.
    pub fn t_with(&self, key: &str, replacements: &[(&str, &str)]) -> String {
        let found = self
            .current
            .as_ref()
            .and_then(|dict| lookup(dict, key))
            .or_else(|| lookup(fallback_dictionary(), key));

        let Some(mut text) = found else {
            warn!("Translation key not found: {}", key);
            return key.to_string();
        };

        for (name, value) in replacements {
            let placeholder = format!("{{{{{}}}}}", name);
            text = text.replacen(&placeholder, value, 1);
        }
        text
    }

    fn reload(&mut self) {
        let code = self.language_code();
        if code == "en" {
            self.current = None;
            return;
        }
        match load_dictionary(&self.locales_dir, code) {
            Ok(dict) => {
                info!(language = code, "loaded translations");
                self.current = Some(dict);
            }
            Err(e) => {
                error!("Error loading translation file: {:#}", e);
                self.current = None;
            }
        }
    }
}

fn load_dictionary(dir: &Path, code: &str) -> Result<Value> {
    let path = dir.join(format!("{code}.json"));
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read translation file {}", path.display()))?;
    let dict: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse translation file {}", path.display()))?;
    anyhow::ensure!(dict.is_object(), "translation file {} is not an object", path.display());
    Ok(dict)
}

/// Walk a dotted path. Only scalar leaves count as found.
fn lookup(dict: &Value, key: &str) -> Option<String> {
    let mut node = dict;
    for part in key.split('.') {
        node = node.get(part)?;
    }
    match node {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
