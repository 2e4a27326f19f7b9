//! Configuration for route discovery.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-request timeout for API document fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default interval between periodic discovery passes.
pub const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(30);

/// What a discovery pass does when one service fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and move on to the next service. The pass still
    /// reports every failure once all services have been tried.
    #[default]
    Continue,
    /// Stop at the first failing service.
    Abort,
}

/// Configuration for [`RouteDiscovery`](crate::RouteDiscovery) and the
/// periodic [`DiscoveryJob`](crate::DiscoveryJob).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Timeout for each API document fetch.
    pub fetch_timeout: Duration,
    /// Interval between periodic passes.
    pub interval: Duration,
    /// Behaviour when a service fails.
    pub failure_policy: FailurePolicy,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            interval: DEFAULT_DISCOVERY_INTERVAL,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Sets the fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the periodic interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.fetch_timeout, Duration::from_millis(5000));
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn test_failure_policy_serde() {
        let policy: FailurePolicy = serde_json::from_str(r#""abort""#).unwrap();
        assert_eq!(policy, FailurePolicy::Abort);
        assert_eq!(
            serde_json::to_string(&FailurePolicy::Continue).unwrap(),
            r#""continue""#
        );
    }
}
