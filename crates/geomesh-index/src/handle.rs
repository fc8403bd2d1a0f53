//! Shared, swappable reference to the live [`PointIndex`].
//!
//! Readers take a snapshot (`Arc` clone) and query it with no lock held.
//! Reloading builds a complete new index first and then replaces the
//! reference; an index is never mutated while queries are in flight.

use std::sync::{Arc, PoisonError, RwLock};

use crate::index::PointIndex;

#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<PointIndex>>,
}

impl IndexHandle {
    #[must_use]
    pub fn new(index: PointIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// Current index. Later swaps do not affect the returned snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PointIndex> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Installs `index` and returns the one it replaced.
    pub fn swap(&self, index: PointIndex) -> Arc<PointIndex> {
        let replacement = Arc::new(index);
        let current = replacement.len();
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, replacement);
        drop(guard);

        tracing::info!(
            previous = previous.len(),
            current,
            "swapped point index"
        );
        previous
    }
}

impl Default for IndexHandle {
    fn default() -> Self {
        Self::new(PointIndex::empty())
    }
}
