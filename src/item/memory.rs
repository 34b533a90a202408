use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

use log::debug;

use crate::{
    BatchError,
    core::{
        item::{ItemReader, ItemReaderResult, ItemWriter, ItemWriterResult},
        transaction::{TransactionManager, TransactionResult},
    },
};

/// Hands out a pre-loaded list of items in order.
pub struct InMemoryItemReader<T> {
    items: RefCell<VecDeque<T>>,
}

impl<T> InMemoryItemReader<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items.into()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.items.borrow().len()
    }
}

impl<T> ItemReader<T> for InMemoryItemReader<T> {
    fn read(&self) -> ItemReaderResult<T> {
        Ok(self.items.borrow_mut().pop_front())
    }
}

/// Transactional in-memory store.
///
/// Inside a transaction, written items are staged and only become visible through
/// [`items`](Self::items) once committed; a rollback discards them. Writes outside a
/// transaction are visible immediately. Use the same instance as writer and transaction
/// manager of a step.
pub struct InMemoryItemWriter<T> {
    committed: RefCell<Vec<T>>,
    staged: RefCell<Vec<T>>,
    in_transaction: Cell<bool>,
}

impl<T> Default for InMemoryItemWriter<T> {
    fn default() -> Self {
        Self {
            committed: RefCell::new(Vec::new()),
            staged: RefCell::new(Vec::new()),
            in_transaction: Cell::new(false),
        }
    }
}

impl<T: Clone> InMemoryItemWriter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed items, in write order.
    pub fn items(&self) -> Vec<T> {
        self.committed.borrow().clone()
    }

    pub fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.committed
            .borrow()
            .iter()
            .find(|item| predicate(item))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.committed.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.borrow().is_empty()
    }
}

impl<T: Clone> ItemWriter<T> for InMemoryItemWriter<T> {
    fn write(&self, items: &[T]) -> ItemWriterResult {
        if self.in_transaction.get() {
            self.staged.borrow_mut().extend_from_slice(items);
        } else {
            self.committed.borrow_mut().extend_from_slice(items);
        }
        Ok(())
    }
}

impl<T> TransactionManager for InMemoryItemWriter<T> {
    fn begin(&self) -> TransactionResult {
        if self.in_transaction.replace(true) {
            return Err(BatchError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }
        self.staged.borrow_mut().clear();
        Ok(())
    }

    fn commit(&self) -> TransactionResult {
        if !self.in_transaction.replace(false) {
            return Err(BatchError::Transaction(
                "no active transaction to commit".to_string(),
            ));
        }
        let mut staged = self.staged.borrow_mut();
        debug!("Committing {} staged items", staged.len());
        self.committed.borrow_mut().append(&mut staged);
        Ok(())
    }

    fn rollback(&self) -> TransactionResult {
        self.in_transaction.set(false);
        let discarded = self.staged.borrow_mut().drain(..).count();
        debug!("Rolled back {} staged items", discarded);
        Ok(())
    }
}
