use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::translate::cache::LoadingStrategy;
use crate::translate::validation::Limits;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub translation_config: TranslationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Settings for model loading, the inference runtime and request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Load models on first use instead of at startup.
    #[serde(default)]
    pub lazy_loading: bool,
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_num_beams")]
    pub num_beams: u32,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    /// Upper bound for any single call to the inference runtime.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_inference_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_max_text_chars() -> usize {
    500
}

fn default_max_words() -> usize {
    10
}

fn default_max_batch_size() -> usize {
    100
}

fn default_num_beams() -> u32 {
    4
}

fn default_max_length() -> u32 {
    512
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            lazy_loading: false,
            inference_url: default_inference_url(),
            max_text_chars: default_max_text_chars(),
            max_words: default_max_words(),
            max_batch_size: default_max_batch_size(),
            num_beams: default_num_beams(),
            max_length: default_max_length(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl TranslationConfig {
    pub fn loading_strategy(&self) -> LoadingStrategy {
        if self.lazy_loading {
            LoadingStrategy::Lazy
        } else {
            LoadingStrategy::Eager
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_text_chars: self.max_text_chars,
            max_words: self.max_words,
            max_batch_size: self.max_batch_size,
        }
    }
}

impl Config {
    /// Load a YAML or JSON config file, substituting `${VAR}` placeholders
    /// from the environment before parsing.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = substitute_env_vars(&read_text_file(path)?);

        let path_lower = path.to_lowercase();
        let config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Load the first candidate path that exists.
    ///
    /// Absent files are skipped; a file that exists but fails to read or
    /// parse is an error. `Ok(None)` means no candidate exists.
    pub fn discover(paths: &[String]) -> Result<Option<(Self, String)>> {
        for path in paths {
            if !Path::new(path).exists() {
                debug!("No config file at {}", path);
                continue;
            }
            let config = Self::load(path)
                .with_context(|| format!("Invalid configuration file: {}", path))?;
            return Ok(Some((config, path.clone())));
        }
        Ok(None)
    }

    /// Apply `TRANSLATION_LAZY_LOADING`, `INFERENCE_SERVICE_URL` and `PORT`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TRANSLATION_LAZY_LOADING") {
            self.translation_config.lazy_loading = value.trim().eq_ignore_ascii_case("true");
        }
        if let Some(url) = lookup("INFERENCE_SERVICE_URL") {
            self.translation_config.inference_url = url;
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(port) => self.system_config.port = port,
                Err(e) => debug!("Ignoring invalid PORT {:?}: {}", port, e),
            }
        }
    }
}

/// Read a config file as UTF-8, dropping a leading byte order mark.
fn read_text_file(path: &str) -> Result<String> {
    let bytes = fs::read(path)?;
    let (content, _had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    Ok(content.into_owned())
}

fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("valid placeholder pattern");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
