//! Execution contexts and the per-context instance store.
//!
//! A `PerContext` instance is cached under the pair (service key, context id).
//! Which context a resolution runs in is decided by a [`ContextSource`]; the
//! default source hands out one id per OS thread, and instances cached under
//! a thread's own id are evicted when that thread exits. Pooled threads or
//! cooperative tasks that reuse a context should call
//! [`Container::clear_context`](crate::Container::clear_context) between
//! logical units of work.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::key::ServiceKey;
use crate::registration::AnyArc;

// Thread ids live in the upper half of the id space so they never collide
// with small explicit ids.
const THREAD_CONTEXT_BASE: u64 = 1 << 63;

static NEXT_THREAD_CONTEXT: AtomicU64 = AtomicU64::new(THREAD_CONTEXT_BASE);

type ContextEntries = DashMap<(ServiceKey, ContextId), AnyArc>;

thread_local! {
    static THREAD_CONTEXT: ContextId = ContextId(NEXT_THREAD_CONTEXT.fetch_add(1, Ordering::Relaxed));
    static THREAD_EXIT: RefCell<ThreadExit> = RefCell::new(ThreadExit::new());
}

/// Identifier of one execution context.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::ContextId;
///
/// let here = ContextId::current_thread();
/// assert_eq!(here, ContextId::current_thread());
///
/// let there = std::thread::spawn(ContextId::current_thread).join().unwrap();
/// assert_ne!(here, there);
/// assert_eq!(ContextId::new(7).as_u64(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Id of the calling OS thread, stable for the thread's lifetime.
    pub fn current_thread() -> Self {
        THREAD_CONTEXT.with(|id| *id)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Decides which execution context a resolution belongs to.
pub trait ContextSource: Send + Sync {
    fn current(&self) -> ContextId;
}

/// One context per OS thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadContextSource;

impl ContextSource for ThreadContextSource {
    #[inline]
    fn current(&self) -> ContextId {
        ContextId::current_thread()
    }
}

impl<F> ContextSource for F
where
    F: Fn() -> ContextId + Send + Sync,
{
    fn current(&self) -> ContextId {
        self()
    }
}

/// Stores holding instances cached under the current thread's own context.
///
/// Lives in thread-local storage, so it is dropped when the thread exits and
/// evicts that thread's entries from every store that is still alive.
struct ThreadExit {
    context: ContextId,
    stores: Vec<Weak<ContextEntries>>,
}

impl ThreadExit {
    fn new() -> Self {
        Self {
            context: ContextId::current_thread(),
            stores: Vec::new(),
        }
    }

    fn watch(&mut self, entries: &Arc<ContextEntries>) {
        self.stores.retain(|store| store.strong_count() > 0);
        if !self
            .stores
            .iter()
            .any(|store| Weak::as_ptr(store) == Arc::as_ptr(entries))
        {
            self.stores.push(Arc::downgrade(entries));
        }
    }
}

impl Drop for ThreadExit {
    fn drop(&mut self) {
        for store in self.stores.drain(..).filter_map(|store| store.upgrade()) {
            let evicted = evict(&store, self.context);
            if evicted > 0 {
                tracing::trace!(context = %self.context, evicted, "thread exited, evicted per-context instances");
            }
        }
    }
}

/// Removes every entry of `context`, returning how many were removed.
fn evict(entries: &ContextEntries, context: ContextId) -> usize {
    let mut evicted = Vec::new();
    entries.retain(|(_, owner), instance| {
        if *owner == context {
            evicted.push(instance.clone());
            false
        } else {
            true
        }
    });
    // instances are dropped here, after the shard locks are released
    evicted.len()
}

/// Per-context instances, shared by the whole scope tree.
#[derive(Default)]
pub(crate) struct ContextStore {
    entries: Arc<ContextEntries>,
}

impl ContextStore {
    pub(crate) fn get(&self, key: &ServiceKey, context: ContextId) -> Option<AnyArc> {
        self.entries
            .get(&(key.clone(), context))
            .map(|entry| entry.value().clone())
    }

    /// Overwrites any instance already stored for the pair.
    ///
    /// Entries committed under the calling thread's own id are evicted when
    /// the thread exits.
    pub(crate) fn commit(&self, key: ServiceKey, context: ContextId, instance: AnyArc) {
        self.entries.insert((key, context), instance);
        if context == ContextId::current_thread() {
            // a thread already tearing down keeps its entries until clear_context
            let _ = THREAD_EXIT.try_with(|exit| exit.borrow_mut().watch(&self.entries));
        }
    }

    /// Drops every instance of `context`, returning how many were removed.
    pub(crate) fn clear(&self, context: ContextId) -> usize {
        evict(&self.entries, context)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
