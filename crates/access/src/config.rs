//! Engine configuration, read from the environment.

use std::str::FromStr;
use std::time::Duration;

pub const APPLY_MODE_VAR: &str = "GESTOR_MATRIX_APPLY_MODE";
pub const WORKER_POLL_MS_VAR: &str = "GESTOR_MATRIX_WORKER_POLL_MS";
pub const CACHE_VAR: &str = "GESTOR_MATRIX_CACHE";

const DEFAULT_POLL_MS: u64 = 100;

/// How queued matrix updates get applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Right after enqueue, in the caller's thread (single-process deployments).
    Inline,
    /// By a worker thread polling the queue.
    Background,
}

impl FromStr for ApplyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(ApplyMode::Inline),
            "background" => Ok(ApplyMode::Background),
            other => Err(format!("unknown apply mode '{other}' (expected inline or background)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    pub apply_mode: ApplyMode,
    pub worker_poll_interval: Duration,
    pub cache_enabled: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            apply_mode: ApplyMode::Inline,
            worker_poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            cache_enabled: true,
        }
    }
}

impl AccessConfig {
    /// Load from process environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Invalid values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let apply_mode = lookup(APPLY_MODE_VAR)
            .map(|raw| {
                raw.parse::<ApplyMode>().unwrap_or_else(|e| {
                    tracing::warn!(var = APPLY_MODE_VAR, error = %e, "invalid value; using inline");
                    defaults.apply_mode
                })
            })
            .unwrap_or(defaults.apply_mode);

        let worker_poll_interval = lookup(WORKER_POLL_MS_VAR)
            .map(|raw| match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    tracing::warn!(var = WORKER_POLL_MS_VAR, value = %raw, "invalid value; using default");
                    defaults.worker_poll_interval
                }
            })
            .unwrap_or(defaults.worker_poll_interval);

        let cache_enabled = lookup(CACHE_VAR)
            .map(|raw| {
                raw.trim().parse::<bool>().unwrap_or_else(|_| {
                    tracing::warn!(var = CACHE_VAR, value = %raw, "invalid value; cache stays enabled");
                    defaults.cache_enabled
                })
            })
            .unwrap_or(defaults.cache_enabled);

        Self {
            apply_mode,
            worker_poll_interval,
            cache_enabled,
        }
    }

    pub fn with_apply_mode(mut self, apply_mode: ApplyMode) -> Self {
        self.apply_mode = apply_mode;
        self
    }

    pub fn with_worker_poll_interval(mut self, interval: Duration) -> Self {
        self.worker_poll_interval = interval;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(AccessConfig::from_lookup(lookup(&[])), AccessConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = AccessConfig::from_lookup(lookup(&[
            (APPLY_MODE_VAR, "Background"),
            (WORKER_POLL_MS_VAR, "25"),
            (CACHE_VAR, "false"),
        ]));
        assert_eq!(config.apply_mode, ApplyMode::Background);
        assert_eq!(config.worker_poll_interval, Duration::from_millis(25));
        assert!(!config.cache_enabled);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AccessConfig::from_lookup(lookup(&[
            (APPLY_MODE_VAR, "eventually"),
            (WORKER_POLL_MS_VAR, "0"),
            (CACHE_VAR, "maybe"),
        ]));
        assert_eq!(config, AccessConfig::default());
    }

    #[test]
    fn builders_override() {
        let config = AccessConfig::default()
            .with_apply_mode(ApplyMode::Background)
            .with_cache(false);
        assert_eq!(config.apply_mode, ApplyMode::Background);
        assert!(!config.cache_enabled);
    }
}
