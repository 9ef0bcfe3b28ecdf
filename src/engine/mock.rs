//! Mock wallet engine for deterministic testing.
//!
//! This module provides a mock engine implementation that replays scripted
//! responses keyed by `(command, argument)` and records every call it sees.

use super::client::WalletEngine;
use super::types::EngineError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

type CommandKey = (String, String);

/// Mock engine that replays scripted responses.
///
/// Scripted responses for a `(command, argument)` pair are consumed in FIFO
/// order; once a queue is empty the repeating fallback for that pair (if any)
/// answers every further call. Unscripted calls fail, which keeps tests
/// honest about exactly which commands they expect.
#[derive(Clone, Default)]
pub struct MockEngine {
    scripted: Arc<Mutex<HashMap<CommandKey, VecDeque<String>>>>,
    fallbacks: Arc<Mutex<HashMap<CommandKey, String>>>,
    calls: Arc<Mutex<Vec<CommandKey>>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot response for a `(command, argument)` pair.
    pub fn script(&self, command: &str, argument: &str, response: &str) {
        self.scripted
            .lock()
            .unwrap()
            .entry((command.to_string(), argument.to_string()))
            .or_default()
            .push_back(response.to_string());
    }

    /// Set a repeating response for a `(command, argument)` pair, used once
    /// any one-shot responses for the pair are exhausted.
    pub fn script_repeat(&self, command: &str, argument: &str, response: &str) {
        self.fallbacks
            .lock()
            .unwrap()
            .insert((command.to_string(), argument.to_string()), response.to_string());
    }

    /// Every call the engine has seen, in order.
    pub fn calls(&self) -> Vec<CommandKey> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times a command has been called, with any argument.
    pub fn call_count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == command)
            .count()
    }
}

#[async_trait::async_trait]
impl WalletEngine for MockEngine {
    async fn execute(&self, command: &str, argument: &str) -> Result<String, EngineError> {
        let key = (command.to_string(), argument.to_string());
        self.calls.lock().unwrap().push(key.clone());

        if let Some(queue) = self.scripted.lock().unwrap().get_mut(&key) {
            if let Some(response) = queue.pop_front() {
                return Ok(response);
            }
        }

        if let Some(response) = self.fallbacks.lock().unwrap().get(&key) {
            return Ok(response.clone());
        }

        Err(EngineError::CallFailed(format!(
            "no scripted response for command `{}` with argument `{}`",
            command, argument
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_responses_are_consumed_in_order() {
        let mock = MockEngine::new();
        mock.script("height", "", r#"{"height":100}"#);
        mock.script("height", "", r#"{"height":101}"#);

        let first = mock.execute("height", "").await.unwrap();
        let second = mock.execute("height", "").await.unwrap();
        assert!(first.contains("100"));
        assert!(second.contains("101"));

        // Queue exhausted and no fallback set.
        assert!(mock.execute("height", "").await.is_err());
    }

    #[tokio::test]
    async fn fallback_answers_after_queue_is_exhausted() {
        let mock = MockEngine::new();
        mock.script("sync", "", "started");
        mock.script_repeat("sync", "", "already syncing");

        assert_eq!(mock.execute("sync", "").await.unwrap(), "started");
        assert_eq!(mock.execute("sync", "").await.unwrap(), "already syncing");
        assert_eq!(mock.execute("sync", "").await.unwrap(), "already syncing");
    }

    #[tokio::test]
    async fn responses_are_keyed_by_argument() {
        let mock = MockEngine::new();
        mock.script_repeat("getoption", "download_memos", r#"{"download_memos":"wallet"}"#);
        mock.script_repeat(
            "getoption",
            "spam_filter_threshold",
            r#"{"spam_filter_threshold":"50"}"#,
        );

        let memos = mock.execute("getoption", "download_memos").await.unwrap();
        let threshold = mock.execute("getoption", "spam_filter_threshold").await.unwrap();
        assert!(memos.contains("wallet"));
        assert!(threshold.contains("50"));
    }

    #[tokio::test]
    async fn unscripted_calls_fail_but_are_recorded() {
        let mock = MockEngine::new();
        assert!(mock.execute("balance", "").await.is_err());
        assert_eq!(mock.call_count("balance"), 1);
        assert_eq!(
            mock.calls(),
            vec![("balance".to_string(), "".to_string())]
        );
    }
}
