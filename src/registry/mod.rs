//! Append-only storage for releasable resources and shutdown callbacks.

use parking_lot::Mutex;

/// Opaque error returned by a failed resource release.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A resource that can be released exactly once during shutdown.
///
/// The release consumes the handle, so a closer can never run twice.
/// Closures of the shape `FnOnce() -> Result<(), BoxError>` implement
/// this trait automatically.
pub trait Closeable: Send + 'static {
    /// Release the resource.
    fn close(self: Box<Self>) -> Result<(), BoxError>;

    /// Name used in diagnostics when the release fails.
    fn name(&self) -> &str {
        "closer"
    }
}

impl<F> Closeable for F
where
    F: FnOnce() -> Result<(), BoxError> + Send + 'static,
{
    fn close(self: Box<Self>) -> Result<(), BoxError> {
        (*self)()
    }
}

/// A zero-argument callback run during shutdown.
pub type CloseFn = Box<dyn FnOnce() + Send + 'static>;

/// Thread-safe registry of closers and callbacks.
///
/// Supports only append; there is no removal. The orchestrator takes a
/// one-shot snapshot that drains the stored entries, so registrations
/// racing with the snapshot may miss the fan-out (accepted, documented
/// on [`Closer::add_closer`](crate::Closer::add_closer)).
#[derive(Default)]
pub struct Registry {
    slots: Mutex<Slots>,
}

#[derive(Default)]
struct Slots {
    closers: Vec<Box<dyn Closeable>>,
    close_fns: Vec<CloseFn>,
}

impl Registry {
    /// Append a releasable resource.
    pub fn add_closer(&self, closer: Box<dyn Closeable>) {
        self.slots.lock().closers.push(closer);
    }

    /// Append a shutdown callback.
    pub fn add_fn(&self, f: CloseFn) {
        self.slots.lock().close_fns.push(f);
    }

    /// Drain everything registered so far.
    pub fn snapshot(&self) -> (Vec<Box<dyn Closeable>>, Vec<CloseFn>) {
        let mut slots = self.slots.lock();
        (
            std::mem::take(&mut slots.closers),
            std::mem::take(&mut slots.close_fns),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_drains_registry() {
        let registry = Registry::default();
        registry.add_closer(Box::new(|| Ok::<(), BoxError>(())));
        registry.add_fn(Box::new(|| {}));
        registry.add_fn(Box::new(|| {}));

        let (closers, fns) = registry.snapshot();
        assert_eq!(closers.len(), 1);
        assert_eq!(fns.len(), 2);

        let (closers, fns) = registry.snapshot();
        assert!(closers.is_empty());
        assert!(fns.is_empty());
    }

    #[test]
    fn test_registration_after_snapshot_lands_in_next_snapshot() {
        let registry = Registry::default();
        registry.add_fn(Box::new(|| {}));
        let _ = registry.snapshot();

        registry.add_fn(Box::new(|| {}));
        let (_, fns) = registry.snapshot();
        assert_eq!(fns.len(), 1);
    }

    #[test]
    fn test_closure_closer_runs_once() {
        let registry = Registry::default();
        registry.add_closer(Box::new(|| Err(BoxError::from("boom"))));

        let (closers, _) = registry.snapshot();
        let closer = closers.into_iter().next().unwrap();
        assert_eq!(closer.name(), "closer");
        assert!(closer.close().is_err());
    }
}
