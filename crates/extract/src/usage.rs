use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;

use crate::error::Result;
use crate::llm::Completion;

/// Token counts as reported by the provider for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// USD per 1K tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

const PRICES: &[(&str, ModelPrice)] = &[
    ("gpt-3.5-turbo-16k", ModelPrice { prompt_per_1k: 0.003, completion_per_1k: 0.004 }),
    ("gpt-3.5-turbo", ModelPrice { prompt_per_1k: 0.0015, completion_per_1k: 0.002 }),
    ("gpt-4o-mini", ModelPrice { prompt_per_1k: 0.00015, completion_per_1k: 0.0006 }),
    ("gpt-4o", ModelPrice { prompt_per_1k: 0.005, completion_per_1k: 0.015 }),
    ("gpt-4", ModelPrice { prompt_per_1k: 0.03, completion_per_1k: 0.06 }),
];

// Snapshot suffixes: `-0613` or `-2024-08-06`.
static SNAPSHOT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-(?:\d{4}|\d{4}-\d{2}-\d{2})$").expect("valid regex"));

/// Look up the price of a model by exact name or a dated snapshot of it
/// (`gpt-4o-2024-08-06`). Other variants such as `gpt-4-turbo` are unknown.
pub fn price_for(model: &str) -> Option<ModelPrice> {
    PRICES
        .iter()
        .find(|(name, _)| match model.strip_prefix(name) {
            Some(rest) => rest.is_empty() || SNAPSHOT_SUFFIX.is_match(rest),
            None => false,
        })
        .map(|(_, price)| *price)
}

pub fn cost_usd(model: &str, usage: &TokenUsage) -> f64 {
    match price_for(model) {
        Some(price) => {
            usage.prompt_tokens as f64 / 1000.0 * price.prompt_per_1k
                + usage.completion_tokens as f64 / 1000.0 * price.completion_per_1k
        }
        None => 0.0,
    }
}

/// Token and cost accounting for exactly one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub model: String,
    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub successful_requests: u32,
    pub total_cost_usd: f64,
    pub elapsed_ms: u64,
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tokens Used: {}", self.total_tokens)?;
        writeln!(f, "\tPrompt Tokens: {}", self.prompt_tokens)?;
        writeln!(f, "\tCompletion Tokens: {}", self.completion_tokens)?;
        writeln!(f, "Successful Requests: {}", self.successful_requests)?;
        write!(f, "Total Cost (USD): ${}", self.total_cost_usd)
    }
}

/// Scoped measurement around one model call.
///
/// Start it right before the call and stop it right after, whether or not the
/// call succeeded.
pub struct CostMeter {
    model: String,
    started: Instant,
    usage: TokenUsage,
    successful_requests: u32,
}

impl CostMeter {
    pub fn start(model: &str) -> Self {
        Self {
            model: model.to_string(),
            started: Instant::now(),
            usage: TokenUsage::default(),
            successful_requests: 0,
        }
    }

    pub fn observe(&mut self, result: &Result<Completion>) {
        if let Ok(completion) = result {
            self.successful_requests += 1;
            if let Some(usage) = completion.usage {
                self.usage.prompt_tokens += usage.prompt_tokens;
                self.usage.completion_tokens += usage.completion_tokens;
                self.usage.total_tokens += usage.total_tokens;
            }
        }
    }

    pub fn stop(self) -> UsageReport {
        UsageReport {
            total_cost_usd: cost_usd(&self.model, &self.usage),
            model: self.model,
            total_tokens: self.usage.total_tokens,
            prompt_tokens: self.usage.prompt_tokens,
            completion_tokens: self.usage.completion_tokens,
            successful_requests: self.successful_requests,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}

/// Run one model call inside a [`CostMeter`].
pub async fn measure<F>(model: &str, call: F) -> (Result<Completion>, UsageReport)
where
    F: Future<Output = Result<Completion>>,
{
    let mut meter = CostMeter::start(model);
    let result = call.await;
    meter.observe(&result);
    (result, meter.stop())
}
