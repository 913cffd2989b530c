//! Allocator hooks.
//!
//! Every node, owned string and print buffer is charged to a [`Hooks`] implementation before it
//! is created and credited back when it is released. Hooks can refuse a request, in which case
//! the operation fails with [`Error::Allocation`] and leaves its inputs untouched.
//!
//! An [`Arena`](crate::Arena) either receives its hooks explicitly via
//! [`Arena::with_hooks`](crate::Arena::with_hooks) or uses the process-wide hooks installed once
//! with [`init_hooks`].
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

use crate::Error;

/// Allocation policy consulted by arenas and printers.
pub trait Hooks: Send + Sync {
    /// Request `size` bytes. Returning `false` fails the requesting operation.
    fn allocate(&self, size: usize) -> bool;
    /// Release `size` bytes previously granted by [`Hooks::allocate`].
    fn free(&self, size: usize);
}

impl<H: Hooks + ?Sized> Hooks for Arc<H> {
    #[inline]
    fn allocate(&self, size: usize) -> bool {
        (**self).allocate(size)
    }
    #[inline]
    fn free(&self, size: usize) {
        (**self).free(size);
    }
}

/// Hooks that grant every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHooks;

impl Hooks for SystemHooks {
    #[inline]
    fn allocate(&self, _: usize) -> bool {
        true
    }
    #[inline]
    fn free(&self, _: usize) {}
}

/// Hooks that grant requests while the total stays within a byte limit.
#[derive(Debug)]
pub struct Budget {
    limit: usize,
    used: AtomicUsize,
}

impl Budget {
    #[must_use]
    pub fn new(limit: usize) -> Budget {
        Budget {
            limit,
            used: AtomicUsize::new(0),
        }
    }
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
    /// Bytes currently granted and not yet released.
    #[must_use]
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }
}

impl Hooks for Budget {
    fn allocate(&self, size: usize) -> bool {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(size).filter(|total| *total <= self.limit)
            })
            .is_ok()
    }

    fn free(&self, size: usize) {
        // Saturate so a mismatched release cannot wrap the counter.
        let _ = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(size))
            });
    }
}

/// Hooks assembled from a pair of functions.
pub struct FnHooks<A, F> {
    allocate: A,
    free: F,
}

impl<A, F> Hooks for FnHooks<A, F>
where
    A: Fn(usize) -> bool + Send + Sync,
    F: Fn(usize) + Send + Sync,
{
    fn allocate(&self, size: usize) -> bool {
        (self.allocate)(size)
    }
    fn free(&self, size: usize) {
        (self.free)(size);
    }
}

impl<A, F> std::fmt::Debug for FnHooks<A, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHooks").finish_non_exhaustive()
    }
}

/// Build hooks from an allocate function and a matching free function.
pub fn from_fns<A, F>(allocate: A, free: F) -> FnHooks<A, F>
where
    A: Fn(usize) -> bool + Send + Sync,
    F: Fn(usize) + Send + Sync,
{
    FnHooks { allocate, free }
}

static GLOBAL: OnceLock<Arc<dyn Hooks>> = OnceLock::new();

/// Install the process-wide hooks used by [`Arena::new`](crate::Arena::new).
///
/// Must run before the first arena that relies on the process-wide hooks is created: bytes are
/// always released to the hooks that granted them, so swapping hooks later is not supported.
///
/// # Errors
///
/// Returns [`Error::HooksAlreadyInstalled`] if hooks were installed before, or if an arena
/// already fixed the default hooks in place.
pub fn init_hooks(hooks: impl Hooks + 'static) -> Result<(), Error> {
    let hooks: Arc<dyn Hooks> = Arc::new(hooks);
    if GLOBAL.set(hooks).is_ok() {
        log::debug!("Installed process-wide allocator hooks");
        Ok(())
    } else {
        log::warn!("Ignoring a repeated attempt to install allocator hooks");
        Err(Error::HooksAlreadyInstalled)
    }
}

/// The process-wide hooks, falling back to [`SystemHooks`].
///
/// The first call fixes the hooks for the rest of the process.
pub(crate) fn global() -> Arc<dyn Hooks> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(SystemHooks)))
}
