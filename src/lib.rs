//! closedown - process-wide graceful shutdown coordination
//!
//! This crate provides a shutdown coordinator for async services:
//! - Append-only registration of releasable resources and cleanup callbacks
//! - A background listener for OS termination signals (SIGINT and SIGTERM
//!   by default, extendable)
//! - A one-shot, concurrent release fan-out bounded by a configurable
//!   timeout, triggered at most once no matter how many signals or
//!   explicit calls arrive
//! - Cooperative (wait-for-completion) or forceful (process-exit)
//!   termination postures
//!
//! # Example
//!
//! ```no_run
//! use closedown::Closer;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), closedown::ShutdownError> {
//!     let closer = Closer::new(Duration::from_secs(10))?;
//!
//!     closer.add_fn(|| println!("flushing buffers"));
//!     closer.add_closer(|| {
//!         // release a connection pool, listener, file handle, ...
//!         Ok::<(), closedown::BoxError>(())
//!     });
//!
//!     // ... run the service ...
//!
//!     // Blocks until a termination signal (or an explicit `close()`)
//!     // has driven the shutdown to completion.
//!     closer.wait().await;
//!     Ok(())
//! }
//! ```

pub mod closer;
pub mod config;
pub mod registry;
pub mod signal;

pub use closer::{Closer, CloserBuilder, ShutdownError};
pub use config::{Posture, ShutdownConfig};
pub use registry::{BoxError, CloseFn, Closeable};
pub use signal::{SignalName, SignalSet};
