use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use super::error::{TranslateError, TranslateResult};
use super::interface::{ModelLoader, TranslationModel};
use super::registry::{LanguagePairKey, ModelEntry, Registry};

/// When models are brought into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingStrategy {
    /// Every registered model is loaded before the server accepts traffic.
    Eager,
    /// A model is loaded on the first request for its pair.
    Lazy,
}

impl LoadingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadingStrategy::Eager => "eager",
            LoadingStrategy::Lazy => "lazy",
        }
    }
}

impl fmt::Display for LoadingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ModelSlot = Arc<OnceCell<Arc<dyn TranslationModel>>>;

/// Loaded model handles keyed by language pair.
///
/// Each key owns its own `OnceCell`, so concurrent first requests for one
/// pair share a single load while other pairs are unaffected. A failed load
/// leaves the cell empty and the next caller tries again.
pub struct ModelCache {
    registry: Arc<Registry>,
    loader: Arc<dyn ModelLoader>,
    strategy: LoadingStrategy,
    models: DashMap<LanguagePairKey, ModelSlot>,
}

impl ModelCache {
    pub fn new(
        registry: Arc<Registry>,
        loader: Arc<dyn ModelLoader>,
        strategy: LoadingStrategy,
    ) -> Self {
        Self {
            registry,
            loader,
            strategy,
            models: DashMap::new(),
        }
    }

    pub fn strategy(&self) -> LoadingStrategy {
        self.strategy
    }

    pub fn loader(&self) -> &Arc<dyn ModelLoader> {
        &self.loader
    }

    /// Return the handle for `key`, loading it first under lazy loading.
    pub async fn get_model(&self, key: &LanguagePairKey) -> TranslateResult<Arc<dyn TranslationModel>> {
        let entry = self.registry.get(key).ok_or_else(|| TranslateError::UnsupportedPair {
            source_lang: key.source.to_string(),
            target_lang: key.target.to_string(),
            supported: self.registry.pair_keys().join(", "),
        })?;

        let slot = self.slot(key);
        if let Some(model) = slot.get() {
            debug!("Model cache hit for {}", key);
            return Ok(Arc::clone(model));
        }

        match self.strategy {
            LoadingStrategy::Lazy => self.load_into(&slot, entry).await,
            LoadingStrategy::Eager => Err(TranslateError::ModelUnavailable {
                pair: key.to_string(),
                source: anyhow::anyhow!("model {} was not preloaded", entry.model_id),
            }),
        }
    }

    /// Load every registered model concurrently.
    pub async fn preload_all(&self) -> TranslateResult<()> {
        let loads = self.registry.entries().iter().map(|entry| {
            let slot = self.slot(&entry.key);
            let entry = *entry;
            async move { self.load_into(&slot, entry).await.map(|_| ()) }
        });

        futures::future::try_join_all(loads).await?;
        info!("Preloaded {} translation models", self.registry.entries().len());
        Ok(())
    }

    pub fn is_loaded(&self, key: &LanguagePairKey) -> bool {
        self.models
            .get(key)
            .map(|slot| slot.initialized())
            .unwrap_or(false)
    }

    /// Pair keys with a loaded model, in registry order.
    pub fn loaded_pairs(&self) -> Vec<String> {
        self.registry
            .entries()
            .iter()
            .filter(|e| self.is_loaded(&e.key))
            .map(|e| e.key.to_string())
            .collect()
    }

    // The map guard is released when this returns, never held across an await.
    fn slot(&self, key: &LanguagePairKey) -> ModelSlot {
        Arc::clone(self.models.entry(*key).or_default().value())
    }

    async fn load_into(
        &self,
        slot: &ModelSlot,
        entry: ModelEntry,
    ) -> TranslateResult<Arc<dyn TranslationModel>> {
        let model = slot
            .get_or_try_init(|| async {
                info!("Loading model for {}: {}", entry.key, entry.model_id);
                let model = self.loader.load(entry.model_id).await?;
                info!("Successfully loaded model for {}", entry.key);
                Ok::<_, anyhow::Error>(model)
            })
            .await
            .map_err(|source| {
                error!("Failed to load model for {}: {:#}", entry.key, source);
                TranslateError::ModelUnavailable {
                    pair: entry.key.to_string(),
                    source,
                }
            })?;

        Ok(Arc::clone(model))
    }
}

impl Drop for ModelCache {
    fn drop(&mut self) {
        let loaded = self.models.iter().filter(|slot| slot.initialized()).count();
        info!("Releasing model cache with {} loaded models", loaded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::testing::MockLoader;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn key(source: &'static str, target: &'static str) -> LanguagePairKey {
        LanguagePairKey { source, target }
    }

    fn cache(loader: Arc<MockLoader>, strategy: LoadingStrategy) -> Arc<ModelCache> {
        Arc::new(ModelCache::new(Arc::new(Registry::default()), loader, strategy))
    }

    #[tokio::test]
    async fn lazy_loads_on_first_use_then_hits() {
        let loader = MockLoader::new();
        let cache = cache(loader.clone(), LoadingStrategy::Lazy);

        assert!(!cache.is_loaded(&key("en", "he")));
        let model = cache.get_model(&key("en", "he")).await.unwrap();
        assert_eq!(model.model_id(), "Helsinki-NLP/opus-mt-en-he");
        assert!(cache.is_loaded(&key("en", "he")));

        cache.get_model(&key("en", "he")).await.unwrap();
        assert_eq!(loader.load_count(), 1);
        assert_eq!(cache.loaded_pairs(), vec!["en-he".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_first_access_loads_once() {
        let loader = MockLoader::with_delay(Duration::from_millis(50));
        let cache = cache(loader.clone(), LoadingStrategy::Lazy);

        let requests = (0..16).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_model(&key("he", "ru")).await.map(|_| ()) })
        });
        for result in futures::future::join_all(requests).await {
            result.unwrap().unwrap();
        }

        assert_eq!(loader.load_count(), 1);
    }

    /// Loader whose loads only complete once two of them are in flight.
    struct RendezvousLoader {
        barrier: Barrier,
    }

    #[async_trait]
    impl ModelLoader for RendezvousLoader {
        async fn load(&self, model_id: &str) -> Result<Arc<dyn TranslationModel>, anyhow::Error> {
            self.barrier.wait().await;
            MockLoader::new().load(model_id).await
        }
    }

    #[tokio::test]
    async fn different_keys_load_in_parallel() {
        let loader = Arc::new(RendezvousLoader { barrier: Barrier::new(2) });
        let cache = Arc::new(ModelCache::new(
            Arc::new(Registry::default()),
            loader,
            LoadingStrategy::Lazy,
        ));

        let (en_he, he_ru) = (key("en", "he"), key("he", "ru"));
        let both = futures::future::join(cache.get_model(&en_he), cache.get_model(&he_ru));
        let (a, b) = tokio::time::timeout(Duration::from_secs(5), both)
            .await
            .expect("loads for different pairs must not serialize");
        a.unwrap();
        b.unwrap();
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let loader = MockLoader::new();
        loader.set_fail_loads(true);
        let cache = cache(loader.clone(), LoadingStrategy::Lazy);

        let err = cache.get_model(&key("en", "he")).await.err().unwrap();
        assert!(matches!(err, TranslateError::ModelUnavailable { ref pair, .. } if pair == "en-he"));
        assert!(!cache.is_loaded(&key("en", "he")));

        loader.set_fail_loads(false);
        cache.get_model(&key("en", "he")).await.unwrap();
        assert_eq!(loader.load_count(), 2);
    }

    #[tokio::test]
    async fn unregistered_key_never_loads() {
        let loader = MockLoader::new();
        let cache = cache(loader.clone(), LoadingStrategy::Lazy);

        let err = cache.get_model(&key("ru", "en")).await.err().unwrap();
        assert!(matches!(err, TranslateError::UnsupportedPair { .. }));
        assert_eq!(loader.load_count(), 0);
        assert!(cache.models.is_empty());
    }

    #[tokio::test]
    async fn eager_serves_only_preloaded_models() {
        let loader = MockLoader::new();
        let cache = cache(loader.clone(), LoadingStrategy::Eager);

        let err = cache.get_model(&key("en", "he")).await.err().unwrap();
        assert!(matches!(err, TranslateError::ModelUnavailable { .. }));
        assert_eq!(loader.load_count(), 0);

        cache.preload_all().await.unwrap();
        assert_eq!(loader.load_count(), 4);
        assert_eq!(cache.loaded_pairs().len(), 4);

        cache.get_model(&key("he", "en")).await.unwrap();
        assert_eq!(loader.load_count(), 4);
    }

    #[tokio::test]
    async fn preload_reports_failure() {
        let loader = MockLoader::new();
        loader.set_fail_loads(true);
        let cache = cache(loader, LoadingStrategy::Eager);

        assert!(matches!(
            cache.preload_all().await,
            Err(TranslateError::ModelUnavailable { .. })
        ));
        assert!(cache.loaded_pairs().is_empty());
    }
}
