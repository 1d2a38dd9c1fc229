use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::stt::BatchLimits;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub recognition: RecognitionConfig,
    pub buffer: BufferConfig,
    pub translation: TranslationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Connection settings for the external recognition provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Base URL of the token endpoint
    pub api_base: String,
    /// Base URL of the streaming socket (wss://...)
    pub streaming_base: String,
    pub client_id: String,
    pub client_secret: String,
    pub sample_rate: u32,
    pub encoding: String,
    pub use_itn: bool,
    pub use_disfluency_filter: bool,
    pub use_profanity_filter: bool,
    pub use_punctuation: bool,
    pub use_word_timestamp: bool,
}

/// Sentence batching thresholds and deferred-flush timeouts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub target_sentences: usize,
    pub max_sentences: usize,
    pub partial_timeout_secs: f64,
    pub sentence_timeout_secs: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub cache_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "speechbridge".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://openapi.vito.ai".to_string(),
            streaming_base: "wss://openapi.vito.ai".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            sample_rate: 16000,
            encoding: "LINEAR16".to_string(),
            use_itn: true,
            use_disfluency_filter: true,
            use_profanity_filter: false,
            use_punctuation: true,
            use_word_timestamp: false,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            target_sentences: 4,
            max_sentences: 5,
            partial_timeout_secs: 2.0,
            sentence_timeout_secs: 4.0,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            cache_size: 100,
        }
    }
}

impl BufferConfig {
    pub fn limits(&self) -> BatchLimits {
        BatchLimits {
            target_sentences: self.target_sentences,
            max_sentences: self.max_sentences,
            partial_timeout: Duration::from_secs_f64(self.partial_timeout_secs),
            sentence_timeout: Duration::from_secs_f64(self.sentence_timeout_secs),
        }
    }
}

impl Config {
    /// Load configuration from an optional file, layered with
    /// SPEECHBRIDGE__-prefixed environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SPEECHBRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
