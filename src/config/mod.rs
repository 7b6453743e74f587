//! Configuration types for embedding shutdown settings in application config.

mod types;

pub use types::{Posture, ShutdownConfig};
