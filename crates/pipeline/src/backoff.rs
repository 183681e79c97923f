//! Linear-backoff retry policy for the vision call.
//!
//! The vision provider is the flaky edge of the pipeline, so it gets a
//! small fixed attempt budget with linearly growing delays between
//! attempts: `attempt_index × base_delay` (base 2 s ⇒ 2 s before attempt
//! 2, 4 s before attempt 3). The final attempt may switch to a more
//! conservative fallback model variant.

use std::time::Duration;

/// Tunable parameters for the vision retry strategy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub attempts: u32,
    /// Linear backoff factor between attempts.
    pub base_delay: Duration,
    /// Model variant used for regular attempts.
    pub primary_model: String,
    /// Conservative model variant for the final attempt, if any.
    pub fallback_model: Option<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(2),
            primary_model: "gemini-3-flash-preview".into(),
            fallback_model: Some("gemini-1.5-flash".into()),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep before the given 1-based attempt.
    ///
    /// Attempt 1 runs immediately; attempt `n` waits `(n - 1) × base`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_sub(1)
    }

    /// Model variant for the given 1-based attempt.
    ///
    /// The fallback (when configured) is used only on the final attempt of
    /// a multi-attempt budget.
    pub fn model_for(&self, attempt: u32) -> &str {
        if attempt >= self.attempts && self.attempts > 1 {
            if let Some(fallback) = &self.fallback_model {
                return fallback;
            }
        }
        &self.primary_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(attempts: u32, base_secs: u64) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_delay: Duration::from_secs(base_secs),
            primary_model: "primary".into(),
            fallback_model: Some("fallback".into()),
        }
    }

    #[test]
    fn first_attempt_has_no_delay() {
        assert_eq!(policy(3, 2).delay_before(1), Duration::ZERO);
    }

    #[test]
    fn delays_grow_linearly() {
        let p = policy(3, 2);
        assert_eq!(p.delay_before(2), Duration::from_secs(2));
        assert_eq!(p.delay_before(3), Duration::from_secs(4));
    }

    #[test]
    fn custom_base_delay() {
        let p = policy(4, 5);
        assert_eq!(p.delay_before(4), Duration::from_secs(15));
    }

    #[test]
    fn fallback_model_only_on_final_attempt() {
        let p = policy(3, 2);
        assert_eq!(p.model_for(1), "primary");
        assert_eq!(p.model_for(2), "primary");
        assert_eq!(p.model_for(3), "fallback");
    }

    #[test]
    fn no_fallback_configured_uses_primary_throughout() {
        let p = RetryPolicy {
            fallback_model: None,
            ..policy(3, 2)
        };
        assert_eq!(p.model_for(3), "primary");
    }

    #[test]
    fn single_attempt_budget_stays_on_primary() {
        let p = policy(1, 2);
        assert_eq!(p.model_for(1), "primary");
    }

    #[test]
    fn default_matches_deployed_tuning() {
        let p = RetryPolicy::default();
        assert_eq!(p.attempts, 3);
        assert_eq!(p.delay_before(2), Duration::from_secs(2));
        assert_eq!(p.delay_before(3), Duration::from_secs(4));
    }
}
