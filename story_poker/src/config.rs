//! Client session configuration.

use crate::raffle::DrawPolicy;
use std::time::Duration;

/// Timing and policy knobs of one client session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Delay between observing `voting -> completed` and showing the cards
    pub reveal_delay: Duration,

    /// Raffle countdown before a winner is drawn
    pub raffle_countdown: Duration,

    /// Break countdown granularity
    pub break_tick: Duration,

    /// Age after which reactions are swept
    pub reaction_ttl: Duration,

    /// How often each client sweeps old reactions
    pub reaction_sweep: Duration,

    /// Which client(s) may write the raffle winner
    pub draw_policy: DrawPolicy,

    /// Reject creator-only actions from other users (off: trust model)
    pub enforce_creator: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_millis(5000),
            raffle_countdown: Duration::from_millis(5000),
            break_tick: Duration::from_secs(1),
            reaction_ttl: Duration::from_secs(10),
            reaction_sweep: Duration::from_secs(10),
            draw_policy: DrawPolicy::default(),
            enforce_creator: false,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// - `REVEAL_DELAY_MS` (default: 5000)
    /// - `RAFFLE_COUNTDOWN_MS` (default: 5000)
    /// - `BREAK_TICK_MS` (default: 1000)
    /// - `REACTION_TTL_SECS` (default: 10)
    /// - `REACTION_SWEEP_SECS` (default: 10)
    /// - `RAFFLE_DRAW_POLICY`: `creator` or `every-client` (default: creator)
    /// - `ENFORCE_CREATOR`: `true`/`false` (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            reveal_delay: std::env::var("REVEAL_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.reveal_delay),
            raffle_countdown: std::env::var("RAFFLE_COUNTDOWN_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.raffle_countdown),
            break_tick: std::env::var("BREAK_TICK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.break_tick),
            reaction_ttl: std::env::var("REACTION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.reaction_ttl),
            reaction_sweep: std::env::var("REACTION_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.reaction_sweep),
            draw_policy: std::env::var("RAFFLE_DRAW_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.draw_policy),
            enforce_creator: std::env::var("ENFORCE_CREATOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enforce_creator),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let timers = [
            ("reveal_delay", self.reveal_delay),
            ("raffle_countdown", self.raffle_countdown),
            ("break_tick", self.break_tick),
            ("reaction_ttl", self.reaction_ttl),
            ("reaction_sweep", self.reaction_sweep),
        ];

        for (name, duration) in timers {
            if duration.is_zero() {
                return Err(format!("{name} must be greater than zero"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "REVEAL_DELAY_MS",
        "RAFFLE_COUNTDOWN_MS",
        "BREAK_TICK_MS",
        "REACTION_TTL_SECS",
        "REACTION_SWEEP_SECS",
        "RAFFLE_DRAW_POLICY",
        "ENFORCE_CREATOR",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: env tests are serialized with #[serial]
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn test_default_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reveal_delay, Duration::from_secs(5));
        assert_eq!(config.draw_policy, DrawPolicy::CreatorOnly);
        assert!(!config.enforce_creator);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        assert_eq!(SessionConfig::from_env(), SessionConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        // SAFETY: env tests are serialized with #[serial]
        unsafe {
            std::env::set_var("REVEAL_DELAY_MS", "3125");
            std::env::set_var("RAFFLE_DRAW_POLICY", "every-client");
            std::env::set_var("ENFORCE_CREATOR", "true");
            std::env::set_var("BREAK_TICK_MS", "not-a-number");
        }

        let config = SessionConfig::from_env();
        clear_env();

        assert_eq!(config.reveal_delay, Duration::from_millis(3125));
        assert_eq!(config.draw_policy, DrawPolicy::EveryClient);
        assert!(config.enforce_creator);
        assert_eq!(config.break_tick, Duration::from_secs(1));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let config = SessionConfig {
            break_tick: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err("break_tick must be greater than zero".to_string())
        );
    }
}
