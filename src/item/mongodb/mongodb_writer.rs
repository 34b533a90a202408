use log::debug;
use mongodb::sync::Collection;
use serde::Serialize;

use crate::{
    BatchError,
    core::item::{ItemWriter, ItemWriterResult},
};

/// Inserts each chunk with one ordered `insert_many`.
///
/// The insert is not part of the chunk transaction: an ordered insert stops at the first
/// failing document, and the documents inserted before it remain in the collection.
pub struct MongodbItemWriter<'a, W: Send + Sync> {
    collection: &'a Collection<W>,
}

impl<W: Serialize + Send + Sync> ItemWriter<W> for MongodbItemWriter<'_, W> {
    fn write(&self, items: &[W]) -> ItemWriterResult {
        if items.is_empty() {
            return Ok(());
        }

        let result = self.collection.insert_many(items).ordered(true).run();

        match result {
            Ok(inserted) => {
                debug!(
                    "Inserted {} documents into {}",
                    inserted.inserted_ids.len(),
                    self.collection.name()
                );
                Ok(())
            }
            Err(error) => Err(BatchError::ItemWriter(format!(
                "MongoDB insert into {} failed: {}",
                self.collection.name(),
                error
            ))),
        }
    }
}

pub struct MongodbItemWriterBuilder<'a, W: Send + Sync> {
    collection: Option<&'a Collection<W>>,
}

impl<W: Send + Sync> Default for MongodbItemWriterBuilder<'_, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, W: Send + Sync> MongodbItemWriterBuilder<'a, W> {
    pub fn new() -> Self {
        Self { collection: None }
    }

    pub fn collection(mut self, collection: &'a Collection<W>) -> MongodbItemWriterBuilder<'a, W> {
        self.collection = Some(collection);
        self
    }

    pub fn build(self) -> Result<MongodbItemWriter<'a, W>, BatchError> {
        let collection = self
            .collection
            .ok_or_else(|| BatchError::Configuration("a collection is required".to_string()))?;

        Ok(MongodbItemWriter { collection })
    }
}
