use std::collections::{HashMap, HashSet};

use thiserror::Error;

/// The only place in the core that interprets language tags.
///
/// Built once from a static table and never mutated afterwards — both maps
/// are plain `HashMap`s populated in `new`, not `RwLock`-guarded, since there
/// is nothing to guard after construction.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    short_to_model: HashMap<String, String>,
    model_to_short: HashMap<String, String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

/// The built-in table of short <-> model tags. Short tags are the
/// client-visible ISO-639-1-like codes; model tags follow the
/// Flores-style `xxx_Scrp` convention translation models use internally.
const DEFAULT_TABLE: &[(&str, &str)] = &[
    ("en", "eng_Latn"),
    ("es", "spa_Latn"),
    ("fr", "fra_Latn"),
    ("de", "deu_Latn"),
    ("it", "ita_Latn"),
    ("pt", "por_Latn"),
    ("nl", "nld_Latn"),
    ("ru", "rus_Cyrl"),
    ("zh", "zho_Hans"),
    ("ja", "jpn_Jpan"),
    ("ko", "kor_Hang"),
    ("ar", "arb_Arab"),
    ("hi", "hin_Deva"),
];

impl LanguageRegistry {
    /// Builds a registry from an explicit `(short, model_tag)` table.
    pub fn new(table: &[(&str, &str)]) -> Self {
        let mut short_to_model = HashMap::with_capacity(table.len());
        let mut model_to_short = HashMap::with_capacity(table.len());
        for (short, model) in table {
            short_to_model.insert((*short).to_string(), (*model).to_string());
            model_to_short.insert((*model).to_string(), (*short).to_string());
        }
        Self {
            short_to_model,
            model_to_short,
        }
    }

    /// `resolve(short) -> model_tag | UnsupportedLanguage` — O(1), total.
    pub fn resolve(&self, short: &str) -> Result<&str, UnsupportedLanguage> {
        self.short_to_model
            .get(short)
            .map(String::as_str)
            .ok_or_else(|| UnsupportedLanguage(short.to_string()))
    }

    /// `short_for(model_tag) -> short | None` — used only when the ASR
    /// returns a detected language in model form.
    pub fn short_for(&self, model_tag: &str) -> Option<&str> {
        self.model_to_short.get(model_tag).map(String::as_str)
    }

    /// Whether `short` is a supported client-facing tag.
    pub fn is_supported(&self, short: &str) -> bool {
        self.short_to_model.contains_key(short)
    }

    /// `supported() -> set of short tags`.
    pub fn supported(&self) -> HashSet<&str> {
        self.short_to_model.keys().map(String::as_str).collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE)
    }
}
