use std::sync::Arc;
use tracing::{debug, error, info};

use super::cache::ModelCache;
use super::error::{TranslateError, TranslateResult};
use super::registry::Registry;
use super::types::{
    BatchTranslationResponse, SupportedLanguagesResponse, TranslationResponse,
};
use super::validation::{self, Limits, ValidatedRequest};

/// Validates requests, resolves models through the cache and runs inference.
pub struct TranslationService {
    registry: Arc<Registry>,
    cache: ModelCache,
    limits: Limits,
}

impl TranslationService {
    pub fn new(registry: Arc<Registry>, cache: ModelCache, limits: Limits) -> Self {
        info!(
            "Translation service initialized with {} language pairs ({} loading)",
            registry.entries().len(),
            cache.strategy()
        );
        Self {
            registry,
            cache,
            limits,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Translate `text` from `source_lang` to `target_lang`.
    ///
    /// The response echoes `text` verbatim as `original_text` and carries the
    /// normalized language codes.
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslateResult<TranslationResponse> {
        let request = validation::validate(text, source_lang, target_lang, &self.registry, &self.limits)?;
        self.run(request).await
    }

    /// Translate several texts for one pair, in order.
    ///
    /// Every text is validated before any model is touched.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> TranslateResult<BatchTranslationResponse> {
        validation::validate_batch_size(texts.len(), &self.limits)?;

        let requests = texts
            .iter()
            .map(|text| validation::validate(text, source_lang, target_lang, &self.registry, &self.limits))
            .collect::<TranslateResult<Vec<_>>>()?;

        let mut translations = Vec::with_capacity(requests.len());
        for request in requests {
            translations.push(self.run(request).await?);
        }

        Ok(BatchTranslationResponse {
            total_count: translations.len(),
            translations,
        })
    }

    pub fn supported_languages(&self) -> SupportedLanguagesResponse {
        SupportedLanguagesResponse {
            supported_language_pairs: self.registry.supported_language_pairs(),
            language_codes: self.registry.language_codes(),
        }
    }

    async fn run(&self, request: ValidatedRequest) -> TranslateResult<TranslationResponse> {
        let key = request.entry.key;
        let model = self.cache.get_model(&key).await?;
        debug!("Translating {} chars with {}", request.text.chars().count(), model.model_id());

        let translated = model.translate(&request.text).await.map_err(|source| {
            error!("Translation failed for {}: {:#}", key, source);
            TranslateError::Inference {
                pair: key.to_string(),
                source,
            }
        })?;

        info!("Successfully translated text from {} to {}", key.source, key.target);
        Ok(TranslationResponse {
            translated_text: translated.trim().to_string(),
            source_lang: key.source.to_string(),
            target_lang: key.target.to_string(),
            original_text: request.original_text,
        })
    }
}
