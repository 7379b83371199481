//! Simulator configuration management.
//!
//! Consolidates environment variable reads and CLI overrides into one validated
//! configuration.

use std::time::Duration;

use story_poker::SessionConfig;

/// Upper bound on simulated clients, one session task each
const MAX_PARTICIPANTS: usize = 500;

/// Complete simulator configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of simulated clients, the room creator included
    pub participants: usize,
    /// Name given to the simulated room
    pub room_name: String,
    /// Voting rounds to play before the raffle
    pub rounds: usize,
    /// Seed for card choices; random when unset
    pub seed: Option<u64>,
    /// Run a raffle after the last round
    pub raffle: bool,
    /// Settings shared by every client session
    pub session: SessionConfig,
}

/// Values given on the command line, taking precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub participants: Option<usize>,
    pub room_name: Option<String>,
    pub rounds: Option<usize>,
    pub seed: Option<u64>,
    pub fast: bool,
}

impl SimConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - CLI values that win over `SIM_*` variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but cannot be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let participants = match overrides.participants {
            Some(n) => n,
            None => parse_env_strict("SIM_PARTICIPANTS", 5)?,
        };
        let rounds = match overrides.rounds {
            Some(n) => n,
            None => parse_env_strict("SIM_ROUNDS", 3)?,
        };
        let seed = match overrides.seed {
            Some(seed) => Some(seed),
            None => std::env::var("SIM_SEED")
                .ok()
                .map(|v| {
                    v.parse().map_err(|_| ConfigError::Invalid {
                        var: "SIM_SEED".to_string(),
                        reason: format!("'{v}' is not an unsigned integer"),
                    })
                })
                .transpose()?,
        };

        let room_name = overrides
            .room_name
            .or_else(|| std::env::var("SIM_ROOM_NAME").ok())
            .unwrap_or_else(|| "Sprint planning".to_string());

        let mut session = SessionConfig::from_env();
        if overrides.fast || parse_env_strict("SIM_FAST", false)? {
            session = fast_timers(session);
        }

        Ok(SimConfig {
            participants,
            room_name,
            rounds,
            seed,
            raffle: parse_env_strict("SIM_RAFFLE", true)?,
            session,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participants == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_PARTICIPANTS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.participants > MAX_PARTICIPANTS {
            return Err(ConfigError::Invalid {
                var: "SIM_PARTICIPANTS".to_string(),
                reason: format!("Must be at most {MAX_PARTICIPANTS}"),
            });
        }

        if self.room_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "SIM_ROOM_NAME".to_string(),
                reason: "Must not be blank".to_string(),
            });
        }

        self.session.validate().map_err(ConfigError::Session)
    }

    /// Longest a single step may take before the run is considered stuck
    pub fn step_timeout(&self) -> Duration {
        let slowest = self
            .session
            .reveal_delay
            .max(self.session.raffle_countdown);
        slowest * 2 + Duration::from_secs(5)
    }
}

/// Shrink every timer so a run completes in well under a second
fn fast_timers(session: SessionConfig) -> SessionConfig {
    SessionConfig {
        reveal_delay: Duration::from_millis(50),
        raffle_countdown: Duration::from_millis(50),
        break_tick: Duration::from_millis(10),
        ..session
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Invalid session configuration: {0}")]
    Session(String),
}

/// Parse an environment variable, falling back to `default` only when unset
fn parse_env_strict<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(v) => v.parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("cannot parse '{v}'"),
        }),
        Err(_) => Ok(default),
    }
}
