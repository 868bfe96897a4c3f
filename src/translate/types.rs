use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub original_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTranslationRequest {
    pub texts: Vec<String>,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTranslationResponse {
    pub translations: Vec<TranslationResponse>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedLanguagesResponse {
    pub supported_language_pairs: BTreeMap<String, String>,
    pub language_codes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub loading_strategy: String,
    pub supported_language_pairs: Vec<String>,
    pub loaded_models: Vec<String>,
    pub inference_runtime: bool,
}
