// Test doubles for the curation pipeline.
//
// MockVerifier (CandidateVerifier): HashMap-based URL → Verification, with
// unregistered URLs failing like an unreachable host. Records every call so
// tests can assert ordering and that denied hosts were never contacted.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::traits::{CandidateVerifier, Verification};

pub struct MockVerifier {
    responses: HashMap<String, Verification>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVerifier {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_url(mut self, url: &str, verification: Verification) -> Self {
        self.responses.insert(url.to_string(), verification);
        self
    }

    /// URLs verified so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CandidateVerifier for MockVerifier {
    async fn verify(&self, url: &str) -> Verification {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        self.responses.get(url).cloned().unwrap_or_else(|| {
            Verification::failed(format!("MockVerifier: net::ERR_NAME_NOT_RESOLVED at {url}"))
        })
    }
}
