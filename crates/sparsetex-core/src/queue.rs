//! Activation Queue
//!
//! The paging engine is single-threaded. When several producers (culling
//! jobs, feedback readback, gameplay hints) want tiles, they push requests
//! into a shared queue and the thread owning the engine applies them in one
//! batch.

use parking_lot::Mutex;

use crate::engine::{PagingEngine, TileRequest};

/// Multi-producer collection point for tile requests
#[derive(Debug, Default)]
pub struct ActivationQueue {
    pending: Mutex<Vec<TileRequest>>,
    /// Batch being applied; swapped with `pending` so neither reallocates
    batch: Mutex<Vec<TileRequest>>,
}

impl ActivationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue with room for `capacity` requests per frame
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(Vec::with_capacity(capacity)),
            batch: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Queue one request
    pub fn push(&self, request: TileRequest) {
        self.pending.lock().push(request);
    }

    /// Queue several requests under a single lock
    pub fn extend(&self, requests: impl IntoIterator<Item = TileRequest>) {
        self.pending.lock().extend(requests);
    }

    /// Number of queued requests
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Drop every queued request
    pub fn clear(&self) {
        self.pending.lock().clear();
    }

    /// Apply everything queued so far to `engine` and return how many
    /// distinct requests were applied.
    ///
    /// The batch is sorted by `(mip, y, x)` and deduplicated, so the result
    /// does not depend on how producers interleaved. Coarser levels are
    /// applied last and end up most recently used.
    pub fn apply(&self, engine: &mut PagingEngine) -> usize {
        let mut batch = self.batch.lock();
        std::mem::swap(&mut *batch, &mut *self.pending.lock());

        batch.sort_unstable_by_key(|request| (request.mip, request.y, request.x));
        batch.dedup();

        for request in batch.iter() {
            engine.activate_request(*request);
        }

        let applied = batch.len();
        batch.clear();
        log::trace!("Applied {} queued tile requests", applied);
        applied
    }
}
