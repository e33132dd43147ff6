//! Scripted generator for tests.

use super::{Generator, Message, Role};
use crate::error::GenerationError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

pub struct StubGenerator {
    responses: Mutex<VecDeque<String>>,
    fail_at: Option<usize>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fail_at: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer calls in order with `responses`, then fall back to echoing.
    pub fn with_responses(responses: &[&str]) -> Self {
        let stub = Self::new();
        stub.responses
            .lock()
            .extend(responses.iter().map(|r| r.to_string()));
        stub
    }

    /// Make the `call`-th request (0-based) fail as a rejected request.
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Generator for StubGenerator {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, messages: &[Message]) -> Result<String, GenerationError> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(messages.to_vec());
            requests.len() - 1
        };

        if self.fail_at == Some(call) {
            return Err(GenerationError::Rejected {
                status: 400,
                body: "API key not valid".to_string(),
            });
        }

        if let Some(response) = self.responses.lock().pop_front() {
            return Ok(response);
        }

        let task = messages
            .iter()
            .find(|m| m.role == Role::Task)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("response #{} to: {}", call, task))
    }
}
