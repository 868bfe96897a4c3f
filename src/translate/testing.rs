//! In-memory model runtime used by unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::interface::{ModelLoader, TranslationModel};

/// Model that prefixes its input with the model id.
pub struct MockModel {
    model_id: String,
    fail: bool,
}

#[async_trait]
impl TranslationModel for MockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn translate(&self, text: &str) -> Result<String, anyhow::Error> {
        if self.fail {
            anyhow::bail!("tensor shape mismatch in {}", self.model_id);
        }
        Ok(format!(" [{}] {} ", self.model_id, text))
    }
}

#[derive(Default)]
pub struct MockLoader {
    loads: AtomicUsize,
    delay: Option<Duration>,
    fail_loads: AtomicBool,
    failing_models: Mutex<HashSet<String>>,
    healthy: Option<bool>,
}

impl MockLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn unhealthy() -> Arc<Self> {
        Arc::new(Self {
            healthy: Some(false),
            ..Self::default()
        })
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Models loaded for `model_id` fail at inference time.
    pub fn fail_inference_for(&self, model_id: &str) {
        self.failing_models.lock().unwrap().insert(model_id.to_string());
    }
}

#[async_trait]
impl ModelLoader for MockLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn TranslationModel>, anyhow::Error> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            anyhow::bail!("out of memory while loading {}", model_id);
        }
        let fail = self.failing_models.lock().unwrap().contains(model_id);
        Ok(Arc::new(MockModel {
            model_id: model_id.to_string(),
            fail,
        }))
    }

    async fn health_check(&self) -> Result<bool, anyhow::Error> {
        Ok(self.healthy.unwrap_or(true))
    }
}
