use log::debug;

use crate::{
    BatchError,
    core::item::{ItemProcessor, ItemProcessorResult},
};

/// A business rule checked before an item is persisted.
pub trait Validator<T> {
    /// Returns `Err(BatchError::Validation)` with a user-facing message when `item` breaks the
    /// rule.
    fn validate(&self, item: &T) -> Result<(), BatchError>;
}

impl<T, F> Validator<T> for F
where
    F: Fn(&T) -> Result<(), BatchError>,
{
    fn validate(&self, item: &T) -> Result<(), BatchError> {
        self(item)
    }
}

/// Passes valid items through unchanged.
///
/// Invalid items fail with the validator's error, or are filtered out when the processor is
/// built with [`filter`](Self::filter).
///
/// ```
/// use chunk_batch::BatchError;
/// use chunk_batch::core::item::ItemProcessor;
/// use chunk_batch::item::validation::ValidatingItemProcessor;
///
/// #[derive(Clone, Debug)]
/// struct Book { title: String, author_active: bool }
///
/// let active_author = |book: &Book| {
///     if book.author_active {
///         Ok(())
///     } else {
///         Err(BatchError::Validation("Author is inactive".to_string()))
///     }
/// };
/// let processor = ValidatingItemProcessor::new(active_author);
///
/// let book = Book { title: "Clean Code".to_string(), author_active: false };
/// let error = processor.process(&book).unwrap_err();
///
/// assert_eq!(error.to_string(), "Validation failed: Author is inactive");
/// ```
pub struct ValidatingItemProcessor<V> {
    validator: V,
    filter: bool,
}

impl<V> ValidatingItemProcessor<V> {
    pub fn new(validator: V) -> Self {
        Self {
            validator,
            filter: false,
        }
    }

    pub fn filter(mut self, filter: bool) -> Self {
        self.filter = filter;
        self
    }
}

impl<T, V> ItemProcessor<T, T> for ValidatingItemProcessor<V>
where
    T: Clone,
    V: Validator<T>,
{
    fn process(&self, item: &T) -> ItemProcessorResult<T> {
        match self.validator.validate(item) {
            Ok(()) => Ok(Some(item.clone())),
            Err(error) if self.filter => {
                debug!("Filtering invalid item: {}", error);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}
