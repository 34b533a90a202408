use crate::error::BatchError;

pub type TransactionResult = Result<(), BatchError>;

/// Transaction boundary wrapped around every chunk.
///
/// The step calls `begin` before processing a chunk, then either `commit` once the chunk has
/// been written and flushed, or `rollback` on any failure. Writers backed by a transactional
/// store usually implement this trait themselves so that their writes join the transaction.
pub trait TransactionManager {
    fn begin(&self) -> TransactionResult;
    fn commit(&self) -> TransactionResult;
    fn rollback(&self) -> TransactionResult;
}

/// A transaction manager with no resource behind it. Every operation succeeds.
#[derive(Default, Debug, Clone, Copy)]
pub struct ResourcelessTransactionManager;

impl TransactionManager for ResourcelessTransactionManager {
    fn begin(&self) -> TransactionResult {
        Ok(())
    }

    fn commit(&self) -> TransactionResult {
        Ok(())
    }

    fn rollback(&self) -> TransactionResult {
        Ok(())
    }
}
