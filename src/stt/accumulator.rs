use std::collections::VecDeque;
use std::time::Duration;

use super::corrector::TextCorrector;

/// Emitted batches retained as translation context.
const HISTORY_CAP: usize = 5;
/// History entries joined into the context hint of each batch.
const CONTEXT_WINDOW: usize = 3;

/// Sentence-final endings for Korean declarative, interrogative, imperative
/// and exclamatory forms, plus common spoken contractions.
const SENTENCE_ENDINGS: &[&str] = &[
    "다", "니다", "습니다", "합니다", "입니다", "됩니다",
    "어요", "아요", "에요", "예요", "어", "아", "지", "죠", "거든", "걸",
    "는데", "네", "군", "구나", "란다", "렴", "마", "자", "라",
    "까", "니", "나", "가", "냐", "느냐", "는가", "을까", "을까요",
    "세요", "십시오", "어라", "거라", "시다",
    "군요", "네요", "는구나", "는군요",
    "음", "슴", "심", "임",
];

/// A token ending with a sentence-final suffix does not terminate the
/// sentence when the next token starts with one of these particles.
const CONTINUATION_PARTICLES: &[&str] =
    &["는", "도", "만", "까지", "부터", "라고", "고", "며", "면서"];

/// Which deferred-flush timer the accumulator wants armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTimer {
    /// Only partial text outstanding, likely mid-utterance: short wait.
    Partial,
    /// At least one complete sentence outstanding: longer wait to reach
    /// the target count.
    Sentence,
}

/// Batching thresholds and deferred-flush timeouts.
#[derive(Debug, Clone)]
pub struct BatchLimits {
    pub target_sentences: usize,
    pub max_sentences: usize,
    pub partial_timeout: Duration,
    pub sentence_timeout: Duration,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            target_sentences: 4,
            max_sentences: 5,
            partial_timeout: Duration::from_secs_f64(2.0),
            sentence_timeout: Duration::from_secs_f64(4.0),
        }
    }
}

/// A flushed group of sentences with its translation context hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceBatch {
    pub text: String,
    pub context: String,
}

/// Accumulates transcript fragments into sentence groups.
///
/// Fragments are segmented on sentence boundaries; a batch is emitted
/// inline once enough complete sentences have gathered, otherwise the
/// caller is expected to arm the deferred-flush timer reported by
/// [`armed_timer`](Self::armed_timer).
pub struct SentenceAccumulator {
    limits: BatchLimits,
    sentences: Vec<String>,
    partial: String,
    context_history: VecDeque<String>,
    armed: Option<FlushTimer>,
    corrector: TextCorrector,
}

impl SentenceAccumulator {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            sentences: Vec::new(),
            partial: String::new(),
            context_history: VecDeque::new(),
            armed: None,
            corrector: TextCorrector::new(),
        }
    }

    /// Ingest one recognized fragment. Returns a batch when a size
    /// threshold fired inline; otherwise leaves a timer request armed.
    pub fn ingest(&mut self, raw: &str) -> Option<SentenceBatch> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        // New text always supersedes the previously armed timer.
        self.armed = None;

        let combined = if self.partial.is_empty() {
            raw.to_string()
        } else {
            format!("{} {}", std::mem::take(&mut self.partial), raw)
        };

        let (sentences, remaining) = split_sentences(&combined);
        self.sentences.extend(sentences);
        self.partial = remaining;

        if self.sentences.len() >= self.limits.target_sentences {
            return self.flush();
        }
        if self.sentences.len() >= self.limits.max_sentences {
            return self.flush();
        }

        if !self.sentences.is_empty() {
            self.armed = Some(FlushTimer::Sentence);
        } else if !self.partial.is_empty() {
            self.armed = Some(FlushTimer::Partial);
        }

        None
    }

    /// Finalize the current state into a batch. A forced flush includes the
    /// outstanding partial text even though it is not sentence-terminated.
    /// No-op when nothing is buffered.
    pub fn flush(&mut self) -> Option<SentenceBatch> {
        self.armed = None;

        if self.sentences.is_empty() && self.partial.is_empty() {
            return None;
        }

        let mut parts = std::mem::take(&mut self.sentences);
        if !self.partial.is_empty() {
            parts.push(std::mem::take(&mut self.partial));
        }
        let joined = parts.join(" ");

        let context: Vec<&str> = self
            .context_history
            .iter()
            .rev()
            .take(CONTEXT_WINDOW)
            .map(String::as_str)
            .collect();
        let context = context
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join(" ");

        let text = self.corrector.fix(&joined, &context);

        self.context_history.push_back(text.clone());
        if self.context_history.len() > HISTORY_CAP {
            self.context_history.pop_front();
        }

        Some(SentenceBatch { text, context })
    }

    /// The deferred-flush timer requested by the last ingest, if any.
    pub fn armed_timer(&self) -> Option<FlushTimer> {
        self.armed
    }

    /// Timeout for the currently armed timer.
    pub fn armed_timeout(&self) -> Option<Duration> {
        self.armed.map(|timer| match timer {
            FlushTimer::Partial => self.limits.partial_timeout,
            FlushTimer::Sentence => self.limits.sentence_timeout,
        })
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    pub fn partial_text(&self) -> &str {
        &self.partial
    }

    pub fn context_history_len(&self) -> usize {
        self.context_history.len()
    }
}

fn ends_sentence(word: &str, next: Option<&str>) -> bool {
    if word.ends_with(['.', '!', '?']) {
        return true;
    }
    if SENTENCE_ENDINGS.iter().any(|ending| word.ends_with(ending)) {
        return match next {
            Some(next) => !CONTINUATION_PARTICLES
                .iter()
                .any(|particle| next.starts_with(particle)),
            None => true,
        };
    }
    false
}

/// Split whitespace-tokenized text into complete sentences plus the
/// trailing non-terminated remainder. Always yields some partition.
pub(crate) fn split_sentences(text: &str) -> (Vec<String>, String) {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut sentences = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for (i, word) in words.iter().enumerate() {
        current.push(*word);
        if ends_sentence(word, words.get(i + 1).copied()) {
            sentences.push(current.join(" "));
            current.clear();
        }
    }

    (sentences, current.join(" "))
}
