//! Scripted oracle double for pipeline tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use creaturedex_llm::{LlmError, OutputSchema, PromptPart, StructuredOracle};
use serde_json::Value;

/// Replays a fixed list of answers in order and records every call.
///
/// Once the script runs out, further calls fail with `LlmError::Transport`.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<Value, LlmError>>>,
    log: Mutex<Vec<(String, Vec<PromptPart>)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedOracle {
    pub fn new(script: Vec<Result<Value, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            log: Mutex::new(Vec::new()),
        })
    }

    /// Number of invocations so far
    pub fn calls(&self) -> usize {
        lock(&self.log).len()
    }

    /// Schema names of all invocations, in call order
    pub fn schemas_seen(&self) -> Vec<String> {
        lock(&self.log).iter().map(|(name, _)| name.clone()).collect()
    }

    /// Prompt of the `index`-th invocation
    ///
    /// # Panics
    ///
    /// Panics if fewer than `index + 1` calls were made.
    pub fn prompt(&self, index: usize) -> Vec<PromptPart> {
        lock(&self.log)[index].1.clone()
    }
}

#[async_trait]
impl StructuredOracle for ScriptedOracle {
    async fn invoke(
        &self,
        prompt: Vec<PromptPart>,
        schema: &OutputSchema,
    ) -> Result<Value, LlmError> {
        lock(&self.log).push((schema.name.clone(), prompt));
        lock(&self.script).pop_front().unwrap_or_else(|| {
            Err(LlmError::Transport(format!(
                "scripted oracle has no answer for '{}'",
                schema.name
            )))
        })
    }
}
