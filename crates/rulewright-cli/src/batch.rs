//! JSONL batch runs.
//!
//! Each non-blank input line is a [`RuleRequest`]. Every input line yields
//! exactly one output line, in input order, whatever happens to it.

use futures::stream::{self, StreamExt};
use rulewright_core::{RuleRequest, RuleResponse};
use rulewright_runtime::{RuleError, RuleOrchestrator};
use serde_json::{json, Value};

/// A parsed input line, or the message for a line that could not be read.
pub type BatchLine = Result<RuleRequest, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    Generated,
    Rejected,
    Failed,
}

#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub status: LineStatus,
    pub value: Value,
}

/// Parse JSONL input, skipping blank lines. Line numbers are 1-based.
pub fn parse_lines(input: &str) -> Vec<BatchLine> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<RuleRequest>(line)
                .map_err(|e| format!("line {}: invalid request: {e}", idx + 1))
        })
        .collect()
}

/// Turn one pipeline result into its output line.
pub fn render(result: Result<RuleResponse, RuleError>) -> BatchOutput {
    match result {
        Ok(response) => match serde_json::to_value(&response) {
            Ok(value) => BatchOutput {
                status: LineStatus::Generated,
                value,
            },
            Err(e) => failed(format!("failed to serialize response: {e}")),
        },
        Err(RuleError::Mapping(rejection)) => match serde_json::to_value(&rejection) {
            Ok(value) => BatchOutput {
                status: LineStatus::Rejected,
                value,
            },
            Err(e) => failed(format!("failed to serialize rejection: {e}")),
        },
        Err(err) => failed(err.to_string()),
    }
}

fn failed(message: String) -> BatchOutput {
    BatchOutput {
        status: LineStatus::Failed,
        value: json!({ "error": message }),
    }
}

/// Run every line with at most `concurrency` requests in flight.
pub async fn run(
    orchestrator: &RuleOrchestrator,
    lines: Vec<BatchLine>,
    concurrency: usize,
) -> Vec<BatchOutput> {
    stream::iter(lines)
        .map(|line| async move {
            match line {
                Ok(request) => render(orchestrator.generate(&request).await),
                Err(message) => failed(message),
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Process exit status for a finished batch: any failure wins over a
/// rejection.
pub fn exit_status(outputs: &[BatchOutput]) -> u8 {
    if outputs.iter().any(|o| o.status == LineStatus::Failed) {
        1
    } else if outputs.iter().any(|o| o.status == LineStatus::Rejected) {
        2
    } else {
        0
    }
}
