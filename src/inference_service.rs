use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::translate::interface::{ModelLoader, TranslationModel};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the model runtime that hosts the pretrained translation models.
#[derive(Debug, Clone)]
pub struct InferenceServiceClient {
    client: Client,
    base_url: String,
    num_beams: u32,
    max_length: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadModelRequest {
    pub model_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadModelResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub model_id: String,
    pub text: String,
    pub num_beams: u32,
    pub max_length: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InferenceResponse {
    #[serde(default)]
    pub translated_text: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl InferenceServiceClient {
    /// `request_timeout` bounds every call, including model loads; health
    /// probes are additionally capped at [`HEALTH_TIMEOUT`].
    pub fn new(
        base_url: String,
        num_beams: u32,
        max_length: u32,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
            .timeout(request_timeout)
            .build()
            .context("failed to build inference runtime HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            num_beams,
            max_length,
        })
    }

    pub async fn load_model(&self, model_id: &str) -> Result<()> {
        let url = format!("{}/models/load", self.base_url);
        let request = LoadModelRequest {
            model_id: model_id.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("model runtime unreachable at {}", url))?
            .error_for_status()?;
        let result: LoadModelResponse = response.json().await?;

        if !result.success {
            anyhow::bail!(
                "model runtime could not load {}: {}",
                model_id,
                result.error.unwrap_or_else(|| "Unknown error".to_string())
            );
        }
        Ok(())
    }

    pub async fn infer(&self, model_id: &str, text: &str) -> Result<String> {
        let url = format!("{}/translate", self.base_url);
        let request = InferenceRequest {
            model_id: model_id.to_string(),
            text: text.to_string(),
            num_beams: self.num_beams,
            max_length: self.max_length,
        };

        debug!("Sending inference request: model={}, chars={}", model_id, text.chars().count());
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let result: InferenceResponse = response.json().await?;

        if result.success {
            Ok(result.translated_text)
        } else {
            anyhow::bail!(
                "inference failed for {}: {}",
                model_id,
                result.error.unwrap_or_else(|| "Unknown error".to_string())
            )
        }
    }

    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await?;
        Ok(response.status().is_success())
    }
}

/// A model held by the runtime, addressed by its identifier.
pub struct RemoteModel {
    client: Arc<InferenceServiceClient>,
    model_id: String,
}

#[async_trait]
impl TranslationModel for RemoteModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn translate(&self, text: &str) -> Result<String, anyhow::Error> {
        self.client.infer(&self.model_id, text).await
    }
}

/// Loads models by asking the runtime to bring them into memory.
pub struct RemoteModelLoader {
    client: Arc<InferenceServiceClient>,
}

impl RemoteModelLoader {
    pub fn new(client: Arc<InferenceServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ModelLoader for RemoteModelLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn TranslationModel>, anyhow::Error> {
        self.client.load_model(model_id).await?;
        Ok(Arc::new(RemoteModel {
            client: Arc::clone(&self.client),
            model_id: model_id.to_string(),
        }))
    }

    async fn health_check(&self) -> Result<bool, anyhow::Error> {
        self.client.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = InferenceServiceClient::new("http://runtime:8001/".to_string(), 4, 512, TIMEOUT).unwrap();
        assert_eq!(client.base_url, "http://runtime:8001");
    }

    #[test]
    fn inference_response_tolerates_missing_fields() {
        let failed: InferenceResponse =
            serde_json::from_str(r#"{"success": false, "error": "CUDA out of memory"}"#).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.translated_text, "");
        assert_eq!(failed.error.as_deref(), Some("CUDA out of memory"));
    }

    async fn spawn_runtime() -> String {
        use axum::{routing::{get, post}, Json, Router};

        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/models/load",
                post(|Json(req): Json<LoadModelRequest>| async move {
                    if req.model_id.ends_with("missing") {
                        Json(LoadModelResponse {
                            success: false,
                            error: Some("repository not found".to_string()),
                        })
                    } else {
                        Json(LoadModelResponse { success: true, error: None })
                    }
                }),
            )
            .route(
                "/slow/translate",
                post(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "too late"
                }),
            )
            .route(
                "/translate",
                post(|Json(req): Json<InferenceRequest>| async move {
                    Json(InferenceResponse {
                        translated_text: format!("{}|{}|{}", req.model_id, req.num_beams, req.text),
                        success: true,
                        error: None,
                    })
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn loads_and_translates_through_runtime() {
        let client = Arc::new(InferenceServiceClient::new(spawn_runtime().await, 4, 512, TIMEOUT).unwrap());
        let loader = RemoteModelLoader::new(client);

        assert!(loader.health_check().await.unwrap());
        let model = loader.load("Helsinki-NLP/opus-mt-en-he").await.unwrap();
        assert_eq!(model.model_id(), "Helsinki-NLP/opus-mt-en-he");
        assert_eq!(
            model.translate("Hello world").await.unwrap(),
            "Helsinki-NLP/opus-mt-en-he|4|Hello world"
        );
    }

    #[tokio::test]
    async fn rejected_load_is_an_error() {
        let client = Arc::new(InferenceServiceClient::new(spawn_runtime().await, 4, 512, TIMEOUT).unwrap());
        let loader = RemoteModelLoader::new(client);

        let err = loader.load("Helsinki-NLP/opus-mt-missing").await.err().unwrap();
        assert!(err.to_string().contains("repository not found"));
    }

    #[tokio::test]
    async fn hung_runtime_times_out() {
        let base_url = format!("{}/slow", spawn_runtime().await);
        let client =
            InferenceServiceClient::new(base_url, 4, 512, Duration::from_millis(200)).unwrap();

        let started = std::time::Instant::now();
        let err = client.infer("Helsinki-NLP/opus-mt-en-he", "Hello").await.err().unwrap();
        assert!(started.elapsed() < Duration::from_secs(4));
        let timed_out = err
            .downcast_ref::<reqwest::Error>()
            .map(|e| e.is_timeout())
            .unwrap_or(false);
        assert!(timed_out, "expected timeout, got {:#}", err);
    }
}
