use std::collections::BTreeMap;
use std::fmt;

/// Language codes accepted by the service and their display names.
pub const LANGUAGE_CODES: &[(&str, &str)] = &[
    ("he", "Hebrew"),
    ("ru", "Russian"),
    ("en", "English"),
];

/// Directed language pairs and the pretrained model serving each one.
pub const SUPPORTED_MODELS: &[(&str, &str, &str)] = &[
    ("he", "ru", "Helsinki-NLP/opus-mt-he-ru"),
    ("ru", "he", "Helsinki-NLP/opus-mt-ru-he"),
    ("en", "he", "Helsinki-NLP/opus-mt-en-he"),
    ("he", "en", "Helsinki-NLP/opus-mt-he-en"),
];

/// Ordered `(source, target)` pair of language codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguagePairKey {
    pub source: &'static str,
    pub target: &'static str,
}

impl fmt::Display for LanguagePairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub key: LanguagePairKey,
    pub model_id: &'static str,
}

/// Static lookup from language pair to model identifier.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<ModelEntry>,
    languages: Vec<(&'static str, &'static str)>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(SUPPORTED_MODELS, LANGUAGE_CODES)
    }
}

impl Registry {
    pub fn new(
        models: &[(&'static str, &'static str, &'static str)],
        languages: &[(&'static str, &'static str)],
    ) -> Self {
        let entries = models
            .iter()
            .map(|&(source, target, model_id)| ModelEntry {
                key: LanguagePairKey { source, target },
                model_id,
            })
            .collect();

        Self {
            entries,
            languages: languages.to_vec(),
        }
    }

    /// Look up the model registered for `source -> target`.
    ///
    /// Codes must already be normalized; matching is exact.
    pub fn resolve(&self, source: &str, target: &str) -> Option<ModelEntry> {
        self.entries
            .iter()
            .find(|e| e.key.source == source && e.key.target == target)
            .copied()
    }

    pub fn get(&self, key: &LanguagePairKey) -> Option<ModelEntry> {
        self.resolve(key.source, key.target)
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Canonical static form of a known language code.
    pub fn language_code(&self, code: &str) -> Option<&'static str> {
        self.languages
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(c, _)| *c)
    }

    /// Pair key (`"he-ru"`) to model identifier.
    pub fn supported_language_pairs(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.key.to_string(), e.model_id.to_string()))
            .collect()
    }

    /// Language code to display name.
    pub fn language_codes(&self) -> BTreeMap<String, String> {
        self.languages
            .iter()
            .map(|(code, name)| (code.to_string(), name.to_string()))
            .collect()
    }

    pub fn pair_keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.to_string()).collect()
    }
}
