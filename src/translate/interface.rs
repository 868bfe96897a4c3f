use std::sync::Arc;
use async_trait::async_trait;

/// A loaded, ready-to-invoke translation model.
///
/// The model algorithm itself lives in the inference runtime; this is the
/// handle the cache hands out.
#[async_trait]
pub trait TranslationModel: Send + Sync {
    /// Identifier the model was loaded from, e.g. `Helsinki-NLP/opus-mt-en-he`
    fn model_id(&self) -> &str;

    /// Translate a single piece of text
    async fn translate(&self, text: &str) -> Result<String, anyhow::Error>;
}

/// Produces model handles from model identifiers.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Load the model for `model_id` and return a handle to it
    ///
    /// # Arguments
    /// * `model_id` - Model identifier taken from the registry
    ///
    /// # Returns
    /// Shared handle owned by the model cache
    async fn load(&self, model_id: &str) -> Result<Arc<dyn TranslationModel>, anyhow::Error>;

    /// Whether the backing runtime is reachable
    async fn health_check(&self) -> Result<bool, anyhow::Error> {
        Ok(true)
    }
}
