//! Mock model client for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::MatchError;
use crate::client::ModelClient;
use crate::prompt::Prompt;

/// A configurable mock response for [`MockModel`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Simulate a successful completion with this content.
    Content(String),
    /// Simulate a 401/403 from the provider.
    Auth,
    /// Simulate a connectivity failure.
    Connectivity(String),
    /// Simulate a 429 from the provider.
    RateLimited,
}

/// A hand-rolled mock implementing [`ModelClient`] for tests.
///
/// Supports a fixed response or a sequence (one per call, repeating the
/// last when exhausted), call counting, and capture of the API keys and
/// user prompts each call saw.
pub struct MockModel {
    /// Each call pops the next response; the last is repeated if exhausted.
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    call_count: AtomicUsize,
    seen_keys: Mutex<Vec<String>>,
    seen_prompts: Mutex<Vec<Prompt>>,
}

impl MockModel {
    /// Create a mock that always returns `response`.
    pub fn new(response: MockResponse) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: response,
            call_count: AtomicUsize::new(0),
            seen_keys: Mutex::new(Vec::new()),
            seen_prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(mut responses: Vec<MockResponse>) -> Self {
        assert!(!responses.is_empty(), "sequence must have at least one response");
        // Reverse so we can pop() from the front cheaply.
        responses.reverse();
        let fallback = responses
            .first()
            .cloned()
            .unwrap_or(MockResponse::Content(String::new()));
        Self {
            responses: Mutex::new(responses),
            fallback,
            call_count: AtomicUsize::new(0),
            seen_keys: Mutex::new(Vec::new()),
            seen_prompts: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a mock that completes with the given JSON content.
    pub fn content(content: impl Into<String>) -> Self {
        Self::new(MockResponse::Content(content.into()))
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// API keys received so far, in call order.
    pub fn seen_keys(&self) -> Vec<String> {
        self.seen_keys.lock().unwrap().clone()
    }

    /// User messages received so far, in call order.
    pub fn seen_user_prompts(&self) -> Vec<String> {
        self.seen_prompts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.user.clone())
            .collect()
    }

    fn next_response(&self) -> MockResponse {
        let mut responses = self.responses.lock().unwrap();
        responses.pop().unwrap_or_else(|| self.fallback.clone())
    }
}

impl ModelClient for MockModel {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
        api_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, MatchError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.seen_keys.lock().unwrap().push(api_key.to_string());
        self.seen_prompts.lock().unwrap().push(prompt.clone());

        let response = self.next_response();
        Box::pin(async move {
            match response {
                MockResponse::Content(content) => Ok(content),
                MockResponse::Auth => Err(MatchError::Auth),
                MockResponse::Connectivity(msg) => Err(MatchError::Connectivity(msg)),
                MockResponse::RateLimited => Err(MatchError::RateLimited),
            }
        })
    }
}
