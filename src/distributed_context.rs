//! Refcounted handle to a distributed-cache-bearing shell context.
//!
//! Hooks and the poller each hold their own handle onto the same
//! underlying context; the last one to release it lets the context
//! itself (and its cache client) drop. This is deliberately not `Arc`'s
//! own clone/drop: `acquire()` can observe the count already at zero
//! and return `None`, which plain `Arc::clone` cannot express.

use crate::host::ShellContext;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A shared handle to one tenant's [`ShellContext`], refcounted
/// independently of the `Arc` it wraps.
pub struct DistributedContext<C: ShellContext> {
    context: Arc<C>,
    refcount: Arc<AtomicUsize>,
}

impl<C: ShellContext> DistributedContext<C> {
    /// Wrap `context`, starting the refcount at one.
    pub fn new(context: Arc<C>) -> Self {
        Self {
            context,
            refcount: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Take out another handle onto the same context, incrementing the
    /// refcount. Returns `None` if the count has already dropped to
    /// zero (every prior handle has been released).
    pub fn acquire(&self) -> Option<Self> {
        let mut current = self.refcount.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return None;
            }
            match self.refcount.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(Self {
                        context: Arc::clone(&self.context),
                        refcount: Arc::clone(&self.refcount),
                    })
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Release this handle. Once the count reaches zero the underlying
    /// context drops as soon as every `Arc<C>` clone handed out goes out
    /// of scope; this type has no separate teardown hook to run.
    pub fn release(self) {
        self.refcount.fetch_sub(1, Ordering::AcqRel);
    }

    /// Whether this handle still holds a live reference (count above
    /// zero as of the last observation).
    pub fn is_live(&self) -> bool {
        self.refcount.load(Ordering::Acquire) > 0
    }

    /// The wrapped context, for calling `distributed_cache()` or similar.
    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    /// Identity comparison against another context's `Arc`, used to
    /// detect that the host rebuilt the default tenant's context out
    /// from under the poller.
    pub fn points_at(&self, other: &Arc<C>) -> bool {
        Arc::ptr_eq(&self.context, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DistributedCache;

    struct NullContext;
    impl ShellContext for NullContext {
        fn distributed_cache(&self) -> Option<Arc<dyn DistributedCache>> {
            None
        }
    }

    #[test]
    fn acquire_increments_and_release_decrements() {
        let handle = DistributedContext::new(Arc::new(NullContext));
        let second = handle.acquire().expect("first acquire succeeds");
        assert!(handle.is_live());
        assert!(second.is_live());

        handle.release();
        assert!(second.is_live());

        second.release();
    }

    #[test]
    fn acquire_fails_once_all_handles_released() {
        let handle = DistributedContext::new(Arc::new(NullContext));
        let second = handle.acquire().unwrap();
        handle.release();
        second.release();

        let dangling = DistributedContext {
            context: Arc::new(NullContext),
            refcount: Arc::new(AtomicUsize::new(0)),
        };
        assert!(dangling.acquire().is_none());
    }

    #[test]
    fn points_at_detects_rebuilt_context() {
        let original = Arc::new(NullContext);
        let handle = DistributedContext::new(Arc::clone(&original));
        assert!(handle.points_at(&original));

        let rebuilt = Arc::new(NullContext);
        assert!(!handle.points_at(&rebuilt));
    }
}
