/// Writes chunks into a MongoDB collection.
pub mod mongodb_writer;

pub use mongodb_writer::{MongodbItemWriter, MongodbItemWriterBuilder};
