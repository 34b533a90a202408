//! Mock versions of a writer, a transaction manager and a chunk listener.
use mockall::mock;

use chunk_batch::{
    BatchError,
    core::{
        item::{ItemWriter, ItemWriterResult},
        listener::ChunkListener,
        transaction::{TransactionManager, TransactionResult},
    },
};

use super::User;

mock! {
    pub Writer {}
    impl ItemWriter<User> for Writer {
        fn write(&self, items: &[User]) -> ItemWriterResult;
        fn flush(&self) -> ItemWriterResult;
        fn open(&self) -> ItemWriterResult;
        fn close(&self) -> ItemWriterResult;
    }
}

mock! {
    pub Transactions {}
    impl TransactionManager for Transactions {
        fn begin(&self) -> TransactionResult;
        fn commit(&self) -> TransactionResult;
        fn rollback(&self) -> TransactionResult;
    }
}

mock! {
    pub Listener {}
    impl ChunkListener<User> for Listener {
        fn before_chunk(&self);
        fn after_chunk(&self, items: &[User]);
        fn after_chunk_error(&self, error: &BatchError);
    }
}
