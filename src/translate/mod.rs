//! Korean-to-English translation of flushed sentence batches, with an
//! STT-error-aware prompt and a bounded response cache.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TranslationConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_COMPLETION_TOKENS: u32 = 10_000;

const SYSTEM_PROMPT: &str = "\
You are an expert Korean-to-English translator specialized in fixing \
speech-to-text misrecognition errors.

CRITICAL: Output ONLY the English translation. No Korean, no explanations.

Korean STT often misrecognizes words as phonetically similar but \
contextually wrong words. Identify these errors and translate the INTENDED \
meaning:
1. Phonetic confusion: replace words that make no sense in context with \
phonetically similar words that do.
2. Dropped syllables and particles from fast speech: restore them before \
translating.
3. Connected-speech errors: resolve liaison artifacts to the intended word.
4. Trust context over literal text. If it sounds wrong, it probably is.";

/// Bounded cache keyed by exact source text. Oldest-inserted entry is
/// evicted first; lookups do not refresh insertion order.
pub struct TranslationCache {
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, value: String) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&key) {
            if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
            self.order.push_back(key.clone());
        }
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Chat-completion translation client. Failures are confined to the batch
/// being translated; the caller substitutes an explicit degraded marker.
pub struct Translator {
    http: reqwest::Client,
    config: TranslationConfig,
    cache: Mutex<TranslationCache>,
}

impl Translator {
    pub fn new(config: TranslationConfig) -> Self {
        let cache = Mutex::new(TranslationCache::new(config.cache_size));
        Self {
            http: reqwest::Client::new(),
            config,
            cache,
        }
    }

    /// Translate a batch, using the previous batches as a context hint.
    pub async fn translate(&self, korean: &str, context: &str) -> Result<String> {
        let korean = korean.trim();
        if korean.is_empty() {
            bail!("empty translation input");
        }
        if self.config.api_key.is_empty() {
            bail!("translation API key not configured");
        }

        if let Some(cached) = self.cache.lock().unwrap().get(korean) {
            info!("translation served from cache");
            return Ok(cached);
        }

        let context_hint = if context.is_empty() {
            String::new()
        } else {
            format!("\n\nPrevious context (for reference only): {}", context)
        };
        let user_prompt = format!(
            "Analyze this Korean STT output that likely contains recognition \
             errors, fix them, and translate to natural English. Output only \
             the English translation.\n\nRAW STT OUTPUT: {}{}",
            korean, context_hint
        );

        let request = ChatRequest {
            model: self.config.model.as_str(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };

        let url = format!("{}/v1/chat/completions", self.config.api_base);
        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("translation request failed")?;

        if !response.status().is_success() {
            bail!("translation endpoint returned {}", response.status());
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("unparsable translation response")?;
        let translated = body
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| anyhow!("translation response carried no choices"))?;

        // A response still containing Hangul did not follow the prompt;
        // treat it as a failed batch rather than show listeners Korean.
        if contains_hangul(&translated) {
            warn!("translation output still contains Korean, rejecting");
            bail!("translation output contains Korean");
        }

        self.cache
            .lock()
            .unwrap()
            .insert(korean.to_string(), translated.clone());

        Ok(translated)
    }
}

/// True if the text contains any precomposed Hangul syllable.
pub fn contains_hangul(text: &str) -> bool {
    text.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c))
}
