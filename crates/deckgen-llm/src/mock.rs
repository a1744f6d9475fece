use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use deckgen_core::errors::ProviderError;
use deckgen_core::provider::{Completion, LlmClient, TokenUsage};

/// Pre-programmed responses for deterministic testing without API calls.
#[derive(Clone)]
pub enum MockResponse {
    /// Return the given text as the completion.
    Text(String),
    /// Return an error from the generate() call.
    Error(ProviderError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    pub fn error(error: ProviderError) -> Self {
        Self::Error(error)
    }

    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

enum Script {
    /// One response per call, in order; extra calls error.
    Sequence(Vec<MockResponse>),
    /// The same text for every call.
    Canned(String),
    /// Fail any prompt containing the marker, answer the rest. Lets batch
    /// tests target one request regardless of scheduling order.
    FailOnMarker { marker: String, canned: String },
}

/// Mock model client with scripted behavior.
pub struct MockClient {
    script: Script,
    call_count: AtomicUsize,
}

impl MockClient {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            script: Script::Sequence(responses),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn canned(text: &str) -> Self {
        Self {
            script: Script::Canned(text.to_string()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(marker: &str, canned: &str) -> Self {
        Self {
            script: Script::FailOnMarker {
                marker: marker.to_string(),
                canned: canned.to_string(),
            },
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    fn completion(&self, prompt: &str, content: &str) -> Completion {
        Completion {
            content: content.to_string(),
            model: self.model().to_string(),
            provider: self.provider().to_string(),
            usage: TokenUsage {
                prompt_tokens: (prompt.len() / 4) as u32,
                completion_tokens: (content.len() / 4) as u32,
            },
        }
    }
}

#[async_trait]
impl LlmClient for MockClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);

        match &self.script {
            Script::Canned(text) => Ok(self.completion(prompt, text)),
            Script::FailOnMarker { marker, canned } => {
                if prompt.contains(marker.as_str()) {
                    Err(ProviderError::ServerError {
                        status: 500,
                        body: "simulated provider failure".into(),
                    })
                } else {
                    Ok(self.completion(prompt, canned))
                }
            }
            Script::Sequence(responses) => {
                let mut current = responses.get(idx).ok_or_else(|| {
                    ProviderError::InvalidRequest(format!(
                        "MockClient: no response configured for call {idx}"
                    ))
                })?;

                // Unroll nested delays iteratively to avoid recursive async.
                loop {
                    match current {
                        MockResponse::Text(text) => return Ok(self.completion(prompt, text)),
                        MockResponse::Error(e) => return Err(e.clone()),
                        MockResponse::Delay(duration, inner) => {
                            tokio::time::sleep(*duration).await;
                            current = inner;
                        }
                    }
                }
            }
        }
    }
}
