use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::inference_service::{InferenceServiceClient, RemoteModelLoader};
use crate::translate::{LoadingStrategy, ModelCache, ModelLoader, Registry, TranslationService};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub translation_service: Arc<TranslationService>,
}

impl AppState {
    /// Build state backed by the configured inference runtime.
    ///
    /// Under eager loading every model is loaded before this returns.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let translation_config = &config.translation_config;
        let client = Arc::new(InferenceServiceClient::new(
            translation_config.inference_url.clone(),
            translation_config.num_beams,
            translation_config.max_length,
            Duration::from_secs(translation_config.request_timeout_secs),
        )?);
        info!("Using inference runtime at {}", translation_config.inference_url);

        let state = Self::with_loader(config, Arc::new(RemoteModelLoader::new(client)));
        state.warm_up().await?;
        Ok(state)
    }

    pub fn with_loader(config: Config, loader: Arc<dyn ModelLoader>) -> Self {
        let registry = Arc::new(Registry::default());
        let cache = ModelCache::new(
            Arc::clone(&registry),
            loader,
            config.translation_config.loading_strategy(),
        );
        let translation_service = Arc::new(TranslationService::new(
            registry,
            cache,
            config.translation_config.limits(),
        ));

        Self {
            config,
            translation_service,
        }
    }

    /// Preload models when the strategy asks for it.
    pub async fn warm_up(&self) -> anyhow::Result<()> {
        let cache = self.translation_service.cache();
        if cache.strategy() == LoadingStrategy::Eager {
            info!("Eager loading enabled, loading all translation models");
            cache.preload_all().await?;
        } else {
            info!("Lazy loading enabled, models load on first request");
        }
        Ok(())
    }
}
