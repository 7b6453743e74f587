//! Termination signal identification and the single-fire listener wait.
//!
//! On Unix the coordinator subscribes to a configurable set of signals
//! (SIGINT and SIGTERM by default). On other platforms it falls back to
//! [`tokio::signal::ctrl_c`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Identifier for a watchable termination signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalName {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
    User1,
    User2,
}

impl SignalName {
    /// Conventional uppercase name, as logged on receipt.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::Interrupt => "SIGINT",
            SignalName::Terminate => "SIGTERM",
            SignalName::Hangup => "SIGHUP",
            SignalName::Quit => "SIGQUIT",
            SignalName::User1 => "SIGUSR1",
            SignalName::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            SignalName::Interrupt => SignalKind::interrupt(),
            SignalName::Terminate => SignalKind::terminate(),
            SignalName::Hangup => SignalKind::hangup(),
            SignalName::Quit => SignalKind::quit(),
            SignalName::User1 => SignalKind::user_defined1(),
            SignalName::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of termination signals the listener subscribes to.
///
/// Always contains the defaults (SIGINT, SIGTERM); [`SignalSet::add`]
/// only extends the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSet {
    names: Vec<SignalName>,
}

impl Default for SignalSet {
    fn default() -> Self {
        Self {
            names: vec![SignalName::Interrupt, SignalName::Terminate],
        }
    }
}

impl SignalSet {
    /// Add a signal to the set. Duplicates are ignored.
    pub fn add(&mut self, name: SignalName) {
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    /// The watched signals, defaults first.
    pub fn names(&self) -> &[SignalName] {
        &self.names
    }
}

/// A live subscription to every signal in a [`SignalSet`].
pub(crate) struct Subscription {
    #[cfg(unix)]
    streams: Vec<(SignalName, tokio::signal::unix::Signal)>,
}

/// Register handlers for every signal in the set.
///
/// Must be called from within a Tokio runtime.
#[cfg(unix)]
pub(crate) fn subscribe(set: &SignalSet) -> io::Result<Subscription> {
    use tokio::signal::unix::signal;

    let mut streams = Vec::with_capacity(set.names().len());
    for name in set.names() {
        streams.push((*name, signal(name.kind())?));
    }
    Ok(Subscription { streams })
}

#[cfg(not(unix))]
pub(crate) fn subscribe(_set: &SignalSet) -> io::Result<Subscription> {
    Ok(Subscription {})
}

impl Subscription {
    /// Block until the first watched signal arrives; returns its identity.
    #[cfg(unix)]
    pub(crate) async fn recv(mut self) -> SignalName {
        let waits = self
            .streams
            .iter_mut()
            .map(|(name, stream)| {
                Box::pin(async move {
                    stream.recv().await;
                    *name
                })
            })
            .collect::<Vec<_>>();

        let (name, _, _) = futures::future::select_all(waits).await;
        name
    }

    #[cfg(not(unix))]
    pub(crate) async fn recv(self) -> SignalName {
        let _ = tokio::signal::ctrl_c().await;
        SignalName::Interrupt
    }
}
