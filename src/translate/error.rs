use thiserror::Error;

/// Reasons a translation request is rejected before reaching a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Text cannot be empty")]
    EmptyText,

    #[error("Text exceeds maximum length of {max} characters. Current text has {actual} characters.")]
    TextTooLong { max: usize, actual: usize },

    #[error("Text exceeds maximum length of {max} words. Current text has {actual} words.")]
    TooManyWords { max: usize, actual: usize },

    #[error("Unknown language code '{code}'. Language code must be one of: {allowed}")]
    UnknownLanguage { code: String, allowed: String },

    #[error("Source and target languages must be different")]
    SameLanguage,

    #[error("Batch must contain between 1 and {max} texts, got {actual}")]
    BatchSize { max: usize, actual: usize },
}

impl ValidationError {
    /// Whether the failure concerns the language codes rather than the text.
    pub fn is_language_error(&self) -> bool {
        matches!(self, ValidationError::UnknownLanguage { .. })
    }
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unsupported language pair: {source_lang} -> {target_lang}. Supported pairs: {supported}")]
    UnsupportedPair {
        source_lang: String,
        target_lang: String,
        supported: String,
    },

    /// Loading the model failed, or it is not loaded under eager loading.
    #[error("Model for {pair} is unavailable")]
    ModelUnavailable {
        pair: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Translation failed for {pair}")]
    Inference {
        pair: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type TranslateResult<T> = Result<T, TranslateError>;
