//! Runtime configuration shared by duels and open-world actions.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Timeouts, buffers and seeding for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How long players get to pick an action each turn.
    pub action_timeout: Duration,
    /// How long invited players get to confirm a boss fight.
    pub ready_timeout: Duration,
    /// Longest wait for a row lock before a step counts as contended.
    pub lock_timeout: Duration,
    pub event_buffer_size: usize,
    /// Protection from player attacks after being killed by a player.
    pub attack_shield: Duration,
    /// Fixed seed for reproducible duels. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl RuntimeConfig {
    pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(40);
    pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
    pub const DEFAULT_ATTACK_SHIELD: Duration = Duration::from_secs(40);

    pub const ENV_ACTION_TIMEOUT_SECS: &'static str = "COMBAT_ACTION_TIMEOUT_SECS";
    pub const ENV_READY_TIMEOUT_SECS: &'static str = "COMBAT_READY_TIMEOUT_SECS";
    pub const ENV_LOCK_TIMEOUT_MS: &'static str = "COMBAT_LOCK_TIMEOUT_MS";
    pub const ENV_RNG_SEED: &'static str = "COMBAT_RNG_SEED";

    pub fn new() -> Self {
        Self {
            action_timeout: Self::DEFAULT_ACTION_TIMEOUT,
            ready_timeout: Self::DEFAULT_READY_TIMEOUT,
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER_SIZE,
            attack_shield: Self::DEFAULT_ATTACK_SHIELD,
            rng_seed: None,
        }
    }

    /// Defaults overridden by `COMBAT_*` environment variables.
    ///
    /// Unset variables keep their default; unparsable ones are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();
        if let Some(secs) = read::<u64>(&lookup, Self::ENV_ACTION_TIMEOUT_SECS) {
            config.action_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read::<u64>(&lookup, Self::ENV_READY_TIMEOUT_SECS) {
            config.ready_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = read::<u64>(&lookup, Self::ENV_LOCK_TIMEOUT_MS) {
            config.lock_timeout = Duration::from_millis(ms);
        }
        config.rng_seed = read::<u64>(&lookup, Self::ENV_RNG_SEED);
        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn env_overrides_and_invalid_values_fall_back() {
        let vars: HashMap<&str, &str> = [
            ("COMBAT_ACTION_TIMEOUT_SECS", "5"),
            ("COMBAT_LOCK_TIMEOUT_MS", "not-a-number"),
            ("COMBAT_RNG_SEED", "42"),
        ]
        .into_iter()
        .collect();
        let config = RuntimeConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.action_timeout, Duration::from_secs(5));
        assert_eq!(config.ready_timeout, RuntimeConfig::DEFAULT_READY_TIMEOUT);
        assert_eq!(config.lock_timeout, RuntimeConfig::DEFAULT_LOCK_TIMEOUT);
        assert_eq!(config.rng_seed, Some(42));
    }
}
