use super::error::{TranslateError, TranslateResult, ValidationError};
use super::registry::{ModelEntry, Registry};

/// Input limits, read from configuration once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_text_chars: usize,
    pub max_words: usize,
    pub max_batch_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_text_chars: 500,
            max_words: 10,
            max_batch_size: 100,
        }
    }
}

/// A request that passed every rule and resolved to a registered model.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Trimmed text handed to the model
    pub text: String,
    /// Text exactly as received
    pub original_text: String,
    pub entry: ModelEntry,
}

/// Trim and lower-case a language code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Word = maximal run of non-whitespace.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn validate_text(text: &str, limits: &Limits) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }

    let chars = text.chars().count();
    if chars > limits.max_text_chars {
        return Err(ValidationError::TextTooLong {
            max: limits.max_text_chars,
            actual: chars,
        });
    }

    let words = word_count(text);
    if words > limits.max_words {
        return Err(ValidationError::TooManyWords {
            max: limits.max_words,
            actual: words,
        });
    }

    Ok(())
}

/// Check both codes and resolve the pair against the registry.
pub fn validate_pair(
    source_lang: &str,
    target_lang: &str,
    registry: &Registry,
) -> TranslateResult<ModelEntry> {
    let source = normalize_code(source_lang);
    let target = normalize_code(target_lang);

    for code in [&source, &target] {
        if registry.language_code(code).is_none() {
            let allowed = registry
                .language_codes()
                .into_keys()
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ValidationError::UnknownLanguage {
                code: code.clone(),
                allowed,
            }
            .into());
        }
    }

    if source == target {
        return Err(ValidationError::SameLanguage.into());
    }

    registry
        .resolve(&source, &target)
        .ok_or_else(|| TranslateError::UnsupportedPair {
            source_lang: source,
            target_lang: target,
            supported: registry.pair_keys().join(", "),
        })
}

pub fn validate_batch_size(count: usize, limits: &Limits) -> Result<(), ValidationError> {
    if count == 0 || count > limits.max_batch_size {
        return Err(ValidationError::BatchSize {
            max: limits.max_batch_size,
            actual: count,
        });
    }
    Ok(())
}

/// Run every rule in order; the first failure wins.
pub fn validate(
    text: &str,
    source_lang: &str,
    target_lang: &str,
    registry: &Registry,
    limits: &Limits,
) -> TranslateResult<ValidatedRequest> {
    validate_text(text, limits)?;
    let entry = validate_pair(source_lang, target_lang, registry)?;

    Ok(ValidatedRequest {
        text: text.trim().to_string(),
        original_text: text.to_string(),
        entry,
    })
}
