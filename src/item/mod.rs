/// In-memory reader and transactional writer.
pub mod memory;

/// Readers over a repository returning every record in one call.
pub mod repository;

/// Validation expressed as an item processor.
pub mod validation;

#[cfg(feature = "logger")]
/// A writer logging every item, useful for debugging purposes.
pub mod logger;

#[cfg(feature = "json")]
/// JSON array reader.
pub mod json;

#[cfg(feature = "http")]
/// Reader fetching a JSON array from an HTTP endpoint.
pub mod http;

#[cfg(feature = "rdbc-sqlite")]
/// RDBC (SQLite) item writer taking part in the chunk transaction.
pub mod rdbc;

#[cfg(feature = "mongodb")]
/// MongoDB item writer.
pub mod mongodb;
