use crate::error::BatchError;

/// Result of a single read: `Ok(None)` marks the end of the stream.
pub type ItemReaderResult<I> = Result<Option<I>, BatchError>;

/// Result of processing a single item: `Ok(None)` filters the item out of the chunk.
pub type ItemProcessorResult<O> = Result<Option<O>, BatchError>;

/// Result of writing a chunk.
pub type ItemWriterResult = Result<(), BatchError>;

/// Retrieves input for a step, one item at a time.
///
/// Any error returned by a reader is fatal for the step: read errors are never skipped.
pub trait ItemReader<I> {
    fn read(&self) -> ItemReaderResult<I>;
}

/// Business logic applied to every item read.
///
/// A processor has three outcomes:
/// - `Ok(Some(item))`: the transformed item joins the chunk
/// - `Ok(None)`: the item is filtered out, silently and without counting as a skip
/// - `Err(error)`: the item is skipped if the step's skip policy accepts the error's kind,
///   otherwise the step fails
///
/// Processors must be pure mappings, with no side effects of their own.
///
/// Closures with the signature `Fn(&I) -> ItemProcessorResult<O>` are processors:
///
/// ```
/// use chunk_batch::core::item::{ItemProcessor, ItemProcessorResult};
///
/// let upper = |name: &String| -> ItemProcessorResult<String> { Ok(Some(name.to_uppercase())) };
///
/// assert_eq!(upper.process(&"bret".to_string()).unwrap(), Some("BRET".to_string()));
/// ```
pub trait ItemProcessor<I, O> {
    fn process(&self, item: &I) -> ItemProcessorResult<O>;
}

impl<I, O, F> ItemProcessor<I, O> for F
where
    F: Fn(&I) -> ItemProcessorResult<O>,
{
    fn process(&self, item: &I) -> ItemProcessorResult<O> {
        self(item)
    }
}

/// Output of a step, one chunk at a time.
///
/// A chunk is written by a single `write` call and must persist entirely or not at all.
pub trait ItemWriter<O> {
    fn write(&self, items: &[O]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}

/// Hands every item through unchanged, for steps whose reader and writer share an item type.
#[derive(Default, Debug, Clone, Copy)]
pub struct PassThroughProcessor;

impl<T: Clone> ItemProcessor<T, T> for PassThroughProcessor {
    fn process(&self, item: &T) -> ItemProcessorResult<T> {
        Ok(Some(item.clone()))
    }
}

/// Chains two processors. An item filtered by the first one never reaches the second.
pub struct CompositeItemProcessor<'a, I, M, O> {
    first: &'a dyn ItemProcessor<I, M>,
    second: &'a dyn ItemProcessor<M, O>,
}

impl<'a, I, M, O> CompositeItemProcessor<'a, I, M, O> {
    pub fn new(first: &'a dyn ItemProcessor<I, M>, second: &'a dyn ItemProcessor<M, O>) -> Self {
        Self { first, second }
    }
}

impl<I, M, O> ItemProcessor<I, O> for CompositeItemProcessor<'_, I, M, O> {
    fn process(&self, item: &I) -> ItemProcessorResult<O> {
        match self.first.process(item)? {
            Some(intermediate) => self.second.process(&intermediate),
            None => Ok(None),
        }
    }
}
