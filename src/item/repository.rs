use std::cell::{Cell, RefCell};

use log::debug;

use crate::{
    BatchError,
    core::item::{ItemReader, ItemReaderResult},
};

/// An upstream collection of items, queried explicitly.
pub trait ItemRepository<T> {
    fn find_all(&self) -> Result<Vec<T>, BatchError>;
}

impl<T, P: ItemRepository<T> + ?Sized> ItemRepository<T> for &P {
    fn find_all(&self) -> Result<Vec<T>, BatchError> {
        (**self).find_all()
    }
}

/// Reads every item of an [`ItemRepository`].
///
/// The repository is queried once, on the first `read`; the fetched items are then handed out
/// one at a time. After exhaustion the reader keeps returning `Ok(None)` without querying the
/// repository again.
pub struct RepositoryItemReader<P, T> {
    repository: P,
    buffer: RefCell<Vec<T>>,
    offset: Cell<usize>,
    fetched: Cell<bool>,
}

impl<P: ItemRepository<T>, T: Clone> RepositoryItemReader<P, T> {
    pub fn new(repository: P) -> Self {
        Self {
            repository,
            buffer: RefCell::new(Vec::new()),
            offset: Cell::new(0),
            fetched: Cell::new(false),
        }
    }

    pub fn repository(&self) -> &P {
        &self.repository
    }

    fn fetch(&self) -> Result<(), BatchError> {
        let items = self.repository.find_all()?;
        debug!("Fetched {} items from repository", items.len());
        *self.buffer.borrow_mut() = items;
        self.fetched.set(true);
        Ok(())
    }
}

impl<P: ItemRepository<T>, T: Clone> ItemReader<T> for RepositoryItemReader<P, T> {
    fn read(&self) -> ItemReaderResult<T> {
        if !self.fetched.get() {
            self.fetch()?;
        }

        let item = self.buffer.borrow().get(self.offset.get()).cloned();
        if item.is_some() {
            self.offset.set(self.offset.get() + 1);
        }
        Ok(item)
    }
}
