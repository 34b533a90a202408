/// JSON over HTTP: an [`ItemRepository`](crate::item::repository::ItemRepository) backed by a
/// GET endpoint returning a JSON array, and the reader built on top of it.
pub mod http_repository;

pub use http_repository::{HttpJsonItemReader, HttpJsonRepository, HttpJsonRepositoryBuilder};
