//! Machine-translation collaborator.
//!
//! The alignment engine only ever sees the [`Translator`] trait; the HTTP
//! implementation, per-job caching, and the per-alignment call budget all
//! live here. The translator is batch-capable and deadline-bounded; rate
//! limiting across concurrent jobs is the remote service's concern.

mod http;
mod retry;

pub use http::HttpTranslator;
pub use retry::{RetryConfig, retry_with_backoff};

use crate::core::language::LanguageTag;
use crate::error::BisubError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Batch-capable translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `texts` from `source` into `target`, preserving order and
    /// length.
    async fn translate(
        &self,
        texts: &[String],
        source: LanguageTag,
        target: LanguageTag,
    ) -> crate::Result<Vec<String>>;
}

/// Per-job translator wrapper: caches results for the lifetime of one job
/// and enforces the per-alignment call budget.
///
/// The cache is never shared between jobs; each job constructs its own
/// wrapper around the shared underlying service.
pub struct JobTranslator {
    inner: Arc<dyn Translator>,
    cache: RwLock<HashMap<String, String>>,
    calls: AtomicUsize,
    max_calls: usize,
}

impl JobTranslator {
    /// Wrap `inner` with a fresh cache and the given call budget.
    pub fn new(inner: Arc<dyn Translator>, max_calls: usize) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            max_calls,
        }
    }

    /// Calls issued to the underlying service so far.
    pub fn calls_used(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn cache_key(text: &str, source: LanguageTag, target: LanguageTag) -> String {
        format!("{:x}", md5::compute(format!("{}|{}|{}", source, target, text)))
    }
}

#[async_trait]
impl Translator for JobTranslator {
    async fn translate(
        &self,
        texts: &[String],
        source: LanguageTag,
        target: LanguageTag,
    ) -> crate::Result<Vec<String>> {
        let keys: Vec<String> = texts
            .iter()
            .map(|t| Self::cache_key(t, source, target))
            .collect();

        let mut results: Vec<Option<String>> = vec![None; texts.len()];
        let mut missing: Vec<usize> = Vec::new();
        {
            let cache = self.cache.read().await;
            for (idx, key) in keys.iter().enumerate() {
                match cache.get(key) {
                    Some(hit) => results[idx] = Some(hit.clone()),
                    None => missing.push(idx),
                }
            }
        }

        if !missing.is_empty() {
            if self.calls.fetch_add(1, Ordering::Relaxed) >= self.max_calls {
                return Err(BisubError::translation(format!(
                    "translation budget exhausted ({} calls)",
                    self.max_calls
                )));
            }
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let translated = self.inner.translate(&batch, source, target).await?;
            if translated.len() != batch.len() {
                return Err(BisubError::translation(format!(
                    "translator returned {} results for {} texts",
                    translated.len(),
                    batch.len()
                )));
            }
            let mut cache = self.cache.write().await;
            for (&idx, text) in missing.iter().zip(translated) {
                cache.insert(keys[idx].clone(), text.clone());
                results[idx] = Some(text);
            }
        }

        Ok(results.into_iter().map(|r| r.unwrap()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Echo translator that records how many times it is invoked.
    struct CountingTranslator {
        invocations: Mutex<usize>,
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        async fn translate(
            &self,
            texts: &[String],
            _source: LanguageTag,
            _target: LanguageTag,
        ) -> crate::Result<Vec<String>> {
            *self.invocations.lock().unwrap() += 1;
            Ok(texts.iter().map(|t| format!("[{}]", t)).collect())
        }
    }

    #[tokio::test]
    async fn test_cache_avoids_repeat_calls() {
        let inner = Arc::new(CountingTranslator {
            invocations: Mutex::new(0),
        });
        let job = JobTranslator::new(inner.clone(), 10);
        let texts = vec!["你好".to_string(), "再见".to_string()];

        let first = job
            .translate(&texts, LanguageTag::ZhHans, LanguageTag::En)
            .await
            .unwrap();
        assert_eq!(first, vec!["[你好]", "[再见]"]);
        let second = job
            .translate(&texts, LanguageTag::ZhHans, LanguageTag::En)
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(*inner.invocations.lock().unwrap(), 1);
        assert_eq!(job.calls_used(), 1);
    }

    #[tokio::test]
    async fn test_budget_enforced() {
        let inner = Arc::new(CountingTranslator {
            invocations: Mutex::new(0),
        });
        let job = JobTranslator::new(inner, 2);
        for n in 0..2 {
            let texts = vec![format!("text {}", n)];
            job.translate(&texts, LanguageTag::ZhHans, LanguageTag::En)
                .await
                .unwrap();
        }
        let over = vec!["one more".to_string()];
        let err = job
            .translate(&over, LanguageTag::ZhHans, LanguageTag::En)
            .await;
        assert!(matches!(err, Err(BisubError::Translation(_))));
    }

    #[tokio::test]
    async fn test_cached_texts_bypass_budget() {
        let inner = Arc::new(CountingTranslator {
            invocations: Mutex::new(0),
        });
        let job = JobTranslator::new(inner, 1);
        let texts = vec!["只有一次".to_string()];
        job.translate(&texts, LanguageTag::ZhHans, LanguageTag::En)
            .await
            .unwrap();
        // Budget is spent, but the cached text still resolves.
        let again = job
            .translate(&texts, LanguageTag::ZhHans, LanguageTag::En)
            .await
            .unwrap();
        assert_eq!(again, vec!["[只有一次]"]);
    }
}
