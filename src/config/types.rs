//! Shutdown configuration data types.

use crate::signal::SignalName;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shutdown settings, embeddable in an application's configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShutdownConfig {
    /// Maximum duration allotted to the shutdown phase
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Signals watched in addition to the defaults (SIGINT, SIGTERM)
    #[serde(default)]
    pub extra_signals: Vec<SignalName>,

    /// What happens after shutdown completes or times out
    #[serde(default)]
    pub posture: Posture,

    /// Process exit status used by the forceful posture
    #[serde(default = "default_exit_code")]
    pub exit_code: i32,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            extra_signals: Vec::new(),
            posture: Posture::default(),
            exit_code: default_exit_code(),
        }
    }
}

/// Termination posture after the shutdown phase.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Posture {
    /// Completion is reported through [`Closer::wait`](crate::Closer::wait);
    /// the embedding process decides whether and when to exit.
    #[default]
    Cooperative,
    /// The coordinator terminates the process with a non-zero status
    /// once shutdown completes or the timeout elapses.
    Forceful,
}

fn default_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_exit_code() -> i32 {
    1
}
