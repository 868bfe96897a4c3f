use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;
use crate::translate::types::{
    BatchTranslationRequest, BatchTranslationResponse, HealthResponse,
    SupportedLanguagesResponse, TranslationRequest, TranslationResponse,
};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/supported-languages", get(supported_languages))
        .route("/translate", post(translate_text))
        .route("/translate/batch", post(translate_batch))
}

async fn service_info(State(state): State<AppState>) -> Json<Value> {
    let translation_config = &state.config.translation_config;
    Json(json!({
        "message": "Translation Service",
        "version": env!("CARGO_PKG_VERSION"),
        "limits": {
            "max_text_chars": translation_config.max_text_chars,
            "max_words": translation_config.max_words,
            "max_batch_size": translation_config.max_batch_size
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let service = &state.translation_service;
    let cache = service.cache();

    let runtime_healthy = match cache.loader().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!("Inference runtime health check failed: {:#}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if runtime_healthy { "healthy" } else { "degraded" }.to_string(),
        loading_strategy: cache.strategy().to_string(),
        supported_language_pairs: service.registry().pair_keys(),
        loaded_models: cache.loaded_pairs(),
        inference_runtime: runtime_healthy,
    })
}

async fn supported_languages(State(state): State<AppState>) -> Json<SupportedLanguagesResponse> {
    Json(state.translation_service.supported_languages())
}

async fn translate_text(
    State(state): State<AppState>,
    payload: Result<Json<TranslationRequest>, JsonRejection>,
) -> Result<Json<TranslationResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state
        .translation_service
        .translate(&request.text, &request.source_lang, &request.target_lang)
        .await?;
    Ok(Json(response))
}

async fn translate_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchTranslationRequest>, JsonRejection>,
) -> Result<Json<BatchTranslationResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state
        .translation_service
        .translate_batch(&request.texts, &request.source_lang, &request.target_lang)
        .await?;
    Ok(Json(response))
}
