use crate::error::BatchError;

/// Callbacks around chunk boundaries.
///
/// `after_chunk` runs only once the chunk's transaction has committed, which makes it the
/// place for side effects that must never observe uncommitted data (publishing events,
/// notifying other systems).
pub trait ChunkListener<O> {
    fn before_chunk(&self) {}

    /// Called with the items that were written and committed.
    fn after_chunk(&self, _items: &[O]) {}

    /// Called after the chunk was rolled back.
    fn after_chunk_error(&self, _error: &BatchError) {}
}

/// Notified of every item left out of a chunk because of a skippable processor error.
pub trait SkipListener<I> {
    fn on_skip_in_process(&self, item: &I, error: &BatchError);
}
