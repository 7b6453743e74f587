//! The coordinator façade and the one-shot drop protocol.
//!
//! A [`Closer`] collects releasable resources and callbacks, watches a
//! set of termination signals, and on the first trigger (signal or
//! explicit [`Closer::close`]) releases everything concurrently, bounded
//! by the configured timeout. The fan-out runs exactly once no matter
//! how many triggers arrive.

use crate::config::{Posture, ShutdownConfig};
use crate::registry::{CloseFn, Closeable, Registry};
use crate::signal::{self, SignalName, SignalSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Errors that can occur while constructing a coordinator.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("failed to register signal handler: {0}")]
    SignalRegistration(#[from] std::io::Error),
}

/// Coordinates a bounded-time, concurrent shutdown of registered resources.
///
/// Cloning is cheap; all clones share the same registry and shutdown state.
/// The coordinator is an explicitly owned object: hold it (or a clone)
/// wherever registration or triggering is needed.
#[derive(Clone)]
pub struct Closer {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    timeout: Duration,
    posture: Posture,
    exit_code: i32,
    triggered: AtomicBool,
    done_tx: watch::Sender<bool>,
}

impl Closer {
    /// Create a coordinator watching the default signal set (SIGINT, SIGTERM).
    ///
    /// The signal listener is spawned immediately, so this must be called
    /// from within a Tokio runtime. Fails only if a signal handler cannot
    /// be registered with the OS.
    pub fn new(timeout: Duration) -> Result<Self, ShutdownError> {
        Self::builder(timeout).build()
    }

    /// Start building a coordinator with preregistered closers, extra
    /// signals, or a non-default posture.
    pub fn builder(timeout: Duration) -> CloserBuilder {
        CloserBuilder {
            timeout,
            signals: SignalSet::default(),
            posture: Posture::default(),
            exit_code: 1,
            closers: Vec::new(),
            close_fns: Vec::new(),
        }
    }

    /// Builder seeded from an embeddable config section.
    pub fn from_config(config: &ShutdownConfig) -> CloserBuilder {
        let mut builder = Self::builder(config.timeout)
            .posture(config.posture)
            .exit_code(config.exit_code);
        for name in &config.extra_signals {
            builder = builder.signal(*name);
        }
        builder
    }

    /// Register a releasable resource.
    ///
    /// Safe to call from any number of tasks. Registration after shutdown
    /// has been triggered is accepted but not guaranteed to be included
    /// in the release fan-out; the orchestrator works off a snapshot
    /// taken when shutdown begins.
    pub fn add_closer<C: Closeable>(&self, closer: C) {
        self.inner.registry.add_closer(Box::new(closer));
    }

    /// Register a zero-argument callback to run during shutdown.
    ///
    /// Callbacks should be self-contained and non-blocking; one that
    /// blocks past the timeout keeps running unsupervised. The same
    /// snapshot caveat as [`Closer::add_closer`] applies.
    pub fn add_fn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.registry.add_fn(Box::new(f));
    }

    /// Whether shutdown has been triggered.
    pub fn is_shutdown(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Explicitly trigger shutdown, then wait for it to finish.
    ///
    /// Equivalent to receiving a termination signal. Idempotent: however
    /// many callers invoke this (concurrently or after the fact), the
    /// release fan-out runs exactly once and every caller returns when
    /// it has completed or timed out.
    pub async fn close(&self) {
        self.drop_all().await;
    }

    /// Wait until shutdown has completed or timed out.
    ///
    /// Returns immediately if shutdown already finished.
    pub async fn wait(&self) {
        let mut done = self.inner.done_tx.subscribe();
        // The sender lives inside `inner`, so this cannot fail while
        // `self` is alive.
        let _ = done.wait_for(|finished| *finished).await;
    }

    /// The one-shot drop protocol.
    ///
    /// The first caller wins the latch and runs the fan-out; everyone
    /// else waits for the completion flag.
    async fn drop_all(&self) {
        if self.inner.triggered.swap(true, Ordering::SeqCst) {
            self.wait().await;
            return;
        }

        let (closers, close_fns) = self.inner.registry.snapshot();
        let mut handles: Vec<JoinHandle<()>> =
            Vec::with_capacity(closers.len() + close_fns.len());

        // Each release and callback gets its own blocking task. A panic
        // inside one surfaces as a JoinError on that task alone.
        for closer in closers {
            let name = closer.name().to_owned();
            handles.push(tokio::task::spawn_blocking(move || {
                if let Err(e) = closer.close() {
                    error!(closer = %name, error = %e, "failed to close");
                }
            }));
        }

        for f in close_fns {
            handles.push(tokio::task::spawn_blocking(f));
        }

        info!(
            tasks = handles.len(),
            timeout = ?self.inner.timeout,
            "shutting down, waiting for tasks or until the timeout elapses"
        );

        let wait_all = async {
            for result in futures::future::join_all(handles).await {
                if let Err(e) = result {
                    if e.is_panic() {
                        warn!("shutdown task panicked");
                    }
                }
            }
        };

        // Dropping unfinished JoinHandles detaches them: the timeout
        // bounds how long we wait, not the work itself.
        if tokio::time::timeout(self.inner.timeout, wait_all)
            .await
            .is_err()
        {
            warn!(
                timeout = ?self.inner.timeout,
                "shutdown timeout elapsed, abandoning unfinished tasks"
            );
        }

        // send_replace stores the flag even when no receiver currently
        // exists; a plain send would discard it and strand later waiters.
        let _ = self.inner.done_tx.send_replace(true);

        if self.inner.posture == Posture::Forceful {
            info!(code = self.inner.exit_code, "shutdown complete, exiting");
            std::process::exit(self.inner.exit_code);
        }
    }
}

/// Builder for [`Closer`].
pub struct CloserBuilder {
    timeout: Duration,
    signals: SignalSet,
    posture: Posture,
    exit_code: i32,
    closers: Vec<Box<dyn Closeable>>,
    close_fns: Vec<CloseFn>,
}

impl CloserBuilder {
    /// Preregister a releasable resource.
    pub fn closer<C: Closeable>(mut self, closer: C) -> Self {
        self.closers.push(Box::new(closer));
        self
    }

    /// Preregister a shutdown callback.
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.close_fns.push(Box::new(f));
        self
    }

    /// Watch an additional termination signal.
    ///
    /// SIGINT and SIGTERM are always watched; this only extends the set.
    pub fn signal(mut self, name: SignalName) -> Self {
        self.signals.add(name);
        self
    }

    /// Set the termination posture (default: cooperative).
    pub fn posture(mut self, posture: Posture) -> Self {
        self.posture = posture;
        self
    }

    /// Set the exit status used by the forceful posture (default: 1).
    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Build the coordinator and spawn its signal listener.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Closer, ShutdownError> {
        let subscription = signal::subscribe(&self.signals)?;

        let (done_tx, _) = watch::channel(false);
        let closer = Closer {
            inner: Arc::new(Inner {
                registry: Registry::default(),
                timeout: self.timeout,
                posture: self.posture,
                exit_code: self.exit_code,
                triggered: AtomicBool::new(false),
                done_tx,
            }),
        };

        for c in self.closers {
            closer.inner.registry.add_closer(c);
        }
        for f in self.close_fns {
            closer.inner.registry.add_fn(f);
        }

        // The listener fires once: the first watched signal triggers the
        // drop protocol and the task ends. Later signals go unobserved;
        // the latch would absorb them anyway.
        let listener = closer.clone();
        tokio::spawn(async move {
            let name = subscription.recv().await;
            info!(signal = %name, "received termination signal");
            listener.drop_all().await;
        });

        Ok(closer)
    }
}
