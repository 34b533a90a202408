use serde::Deserialize;
use thiserror::Error;

/// Coarse classification of a [`BatchError`].
///
/// Skip policies decide on the kind of an error rather than on its message, so a processor
/// designates a record as skippable by returning an error of a kind listed in the step's
/// skippable set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ItemReader,
    ItemProcessor,
    InvalidItem,
    Validation,
    ItemWriter,
    Transaction,
    SkipLimitExceeded,
    Step,
    Configuration,
}

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemReader error: {0}")]
    ItemReader(String),

    #[error("ItemProcessor error: {0}")]
    ItemProcessor(String),

    /// A single record the processor refuses to transform. This is the kind skipped by
    /// default in fault tolerant steps.
    #[error("Invalid item {item}: {reason}")]
    InvalidItem { item: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("ItemWriter error: {0}")]
    ItemWriter(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Skip limit of {limit} exceeded")]
    SkipLimitExceeded { limit: usize },

    #[error("Step {name} failed: {source}")]
    Step {
        name: String,
        #[source]
        source: Box<BatchError>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BatchError::ItemReader(_) => ErrorKind::ItemReader,
            BatchError::ItemProcessor(_) => ErrorKind::ItemProcessor,
            BatchError::InvalidItem { .. } => ErrorKind::InvalidItem,
            BatchError::Validation(_) => ErrorKind::Validation,
            BatchError::ItemWriter(_) => ErrorKind::ItemWriter,
            BatchError::Transaction(_) => ErrorKind::Transaction,
            BatchError::SkipLimitExceeded { .. } => ErrorKind::SkipLimitExceeded,
            BatchError::Step { .. } => ErrorKind::Step,
            BatchError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Shortcut for [`BatchError::InvalidItem`].
    pub fn invalid_item(item: impl Into<String>, reason: impl Into<String>) -> Self {
        BatchError::InvalidItem {
            item: item.into(),
            reason: reason.into(),
        }
    }
}
