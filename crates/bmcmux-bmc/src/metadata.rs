//! Per-call execution metadata
//!
//! A [`Metadata`] value is created empty when an operation starts, filled in
//! while providers are attempted and handed back to the caller together with
//! the result. Nothing here outlives the call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// What happened during one multi-provider call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Provider that satisfied the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_provider: Option<String>,

    /// Providers in the order they were attempted
    pub providers_attempted: Vec<String>,

    /// Providers whose connection opened
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub successful_open_conns: Vec<String>,

    /// Providers whose connection closed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub successful_close_conns: Vec<String>,

    /// Provider name to failure text
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub failed_provider_detail: HashMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `provider` is about to be attempted
    pub fn record_attempt(&mut self, provider: &str) {
        self.providers_attempted.push(provider.to_string());
    }

    /// Record the winning provider
    ///
    /// Only the first call has an effect.
    pub fn record_success(&mut self, provider: &str) {
        if self.successful_provider.is_none() {
            self.successful_provider = Some(provider.to_string());
        }
    }

    /// Record why `provider` failed
    pub fn record_failure(&mut self, provider: &str, detail: impl Into<String>) {
        self.failed_provider_detail
            .insert(provider.to_string(), detail.into());
    }

    pub fn record_open(&mut self, provider: &str) {
        push_unique(&mut self.successful_open_conns, provider);
    }

    pub fn record_close(&mut self, provider: &str) {
        push_unique(&mut self.successful_close_conns, provider);
    }

    /// Whether the call succeeded overall
    pub fn succeeded(&self) -> bool {
        self.successful_provider.is_some()
    }

    /// Emit the metadata as one structured event
    pub fn trace(&self, operation: &str) {
        let mut failures: Vec<String> = self
            .failed_provider_detail
            .iter()
            .map(|(name, detail)| format!("{}: {}", name, detail))
            .collect();
        failures.sort();

        debug!(
            operation,
            successful_provider = self.successful_provider.as_deref().unwrap_or(""),
            providers_attempted = ?self.providers_attempted,
            successful_open_conns = ?self.successful_open_conns,
            successful_close_conns = ?self.successful_close_conns,
            failed_provider_detail = ?failures,
            "Execution metadata"
        );
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}
