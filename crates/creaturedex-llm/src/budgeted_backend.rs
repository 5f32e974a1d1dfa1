//! Budgeted backend wrapper for oracle call limiting
//!
//! Wraps any `LlmBackend` and caps the number of invocations per process. The
//! vision and reasoning backends share one [`CallBudget`], so the cap applies
//! to the process as a whole.

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

/// Default budget limit for oracle calls per process
pub(crate) const DEFAULT_BUDGET_LIMIT: u32 = 50;

/// Environment variable for overriding the budget limit
pub(crate) const BUDGET_ENV_VAR: &str = "CREATUREDEX_ORACLE_BUDGET";

/// Counter of attempted calls against a fixed limit.
///
/// Attempts are counted, not successes: a failed call still consumes its slot.
#[derive(Debug)]
pub struct CallBudget {
    used: AtomicU32,
    limit: u32,
}

impl CallBudget {
    #[must_use]
    pub fn new(limit: u32) -> Arc<Self> {
        Arc::new(Self {
            used: AtomicU32::new(0),
            limit,
        })
    }

    /// Budget with limit resolved as env var > config file > default (50).
    #[must_use]
    pub fn from_config(config_budget: Option<u32>) -> Arc<Self> {
        let env_value = std::env::var(BUDGET_ENV_VAR).ok();
        Self::new(resolve_limit(env_value.as_deref(), config_budget))
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of calls attempted so far
    #[must_use]
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    /// Take one slot. Returns the 1-based attempt number, or the error when
    /// the limit has been reached.
    fn acquire(&self) -> Result<u32, LlmError> {
        let current = self.used.fetch_add(1, Ordering::SeqCst);
        let attempted = current + 1;
        if current >= self.limit {
            warn!(limit = self.limit, attempted, "Oracle budget exceeded");
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }
        Ok(attempted)
    }
}

/// Precedence: env var > config file > default. Unparseable env values are ignored.
fn resolve_limit(env_value: Option<&str>, config_budget: Option<u32>) -> u32 {
    if let Some(env_limit) = env_value.and_then(|s| s.trim().parse::<u32>().ok()) {
        debug!(
            limit = env_limit,
            "Using budget limit from environment variable {}", BUDGET_ENV_VAR
        );
        return env_limit;
    }
    if let Some(config_limit) = config_budget {
        debug!(limit = config_limit, "Using budget limit from config file");
        return config_limit;
    }
    debug!(limit = DEFAULT_BUDGET_LIMIT, "Using default budget limit");
    DEFAULT_BUDGET_LIMIT
}

/// A wrapper around an `LlmBackend` that enforces a [`CallBudget`].
pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    budget: Arc<CallBudget>,
}

impl BudgetedBackend {
    pub fn new(inner: Box<dyn LlmBackend>, budget: Arc<CallBudget>) -> Self {
        debug!(limit = budget.limit(), "Creating BudgetedBackend");
        Self { inner, budget }
    }

    #[must_use]
    pub fn budget(&self) -> &Arc<CallBudget> {
        &self.budget
    }
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        // Count the attempt before calling so retries cannot bypass the limit
        let call_count = self.budget.acquire()?;

        debug!(
            call_count,
            limit = self.budget.limit(),
            stage = %inv.stage_id,
            "Budget check passed, invoking inner backend"
        );

        let result = self.inner.invoke(inv).await;

        if let Err(e) = &result {
            debug!(
                call_count,
                limit = self.budget.limit(),
                error = %e,
                "Inner backend invocation failed (budget slot still consumed)"
            );
        }

        result
    }
}
