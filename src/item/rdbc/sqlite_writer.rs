use std::{cell::RefCell, future::Future};

use log::{debug, error};
use sqlx::{Pool, QueryBuilder, Sqlite, Transaction};

use crate::{
    BatchError,
    core::{
        item::{ItemWriter, ItemWriterResult},
        transaction::{TransactionManager, TransactionResult},
    },
    item::rdbc::DatabaseItemBinder,
};

// SQLITE_MAX_VARIABLE_NUMBER since SQLite 3.32
const BIND_LIMIT: usize = 32766;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Inserts items into a SQLite table with multi-row `INSERT` statements.
///
/// The writer is also a [`TransactionManager`]: once `begin` has been called, writes go
/// through the open database transaction until `commit` or `rollback` ends it. Without an
/// open transaction each write is auto-committed.
///
/// `sqlx` is async, so every call blocks on the current Tokio runtime with
/// `block_in_place`. The runtime must be multi-threaded.
///
/// ```no_run
/// use chunk_batch::item::rdbc::{DatabaseItemBinder, SqliteItemWriterBuilder};
/// use sqlx::{query_builder::Separated, Sqlite, SqlitePool};
///
/// #[derive(Clone)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// struct UserBinder;
///
/// impl DatabaseItemBinder<User, Sqlite> for UserBinder {
///     fn bind(&self, item: &User, mut query_builder: Separated<Sqlite, &str>) {
///         query_builder.push_bind(item.id);
///         query_builder.push_bind(item.name.clone());
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SqlitePool::connect("sqlite://users.db").await?;
/// let binder = UserBinder;
///
/// let writer = SqliteItemWriterBuilder::new()
///     .pool(&pool)
///     .table("users")
///     .add_column("id")
///     .add_column("name")
///     .item_binder(&binder)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteItemWriter<'a, O> {
    pool: &'a Pool<Sqlite>,
    table: &'a str,
    columns: Vec<&'a str>,
    item_binder: &'a dyn DatabaseItemBinder<O, Sqlite>,
    transaction: RefCell<Option<Transaction<'static, Sqlite>>>,
}

impl<O> SqliteItemWriter<'_, O> {
    pub fn table(&self) -> &str {
        self.table
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.borrow().is_some()
    }

    fn insert(&self, items: &[O]) -> Result<u64, sqlx::Error> {
        let mut query_builder = QueryBuilder::new("INSERT INTO ");
        query_builder.push(self.table);
        query_builder.push(" (");
        query_builder.push(self.columns.join(","));
        query_builder.push(") ");

        query_builder.push_values(items, |b, item| {
            self.item_binder.bind(item, b);
        });

        let query = query_builder.build();

        let mut transaction = self.transaction.borrow_mut();
        let result = match transaction.as_mut() {
            Some(tx) => block_on(query.execute(&mut **tx)),
            None => block_on(query.execute(self.pool)),
        };

        result.map(|done| done.rows_affected())
    }
}

impl<O> ItemWriter<O> for SqliteItemWriter<'_, O> {
    fn write(&self, items: &[O]) -> ItemWriterResult {
        let rows_per_statement = BIND_LIMIT / self.columns.len();

        for batch in items.chunks(rows_per_statement) {
            match self.insert(batch) {
                Ok(rows) => debug!("Inserted {} rows into {}", rows, self.table),
                Err(e) => {
                    error!("Failed to insert into {}: {}", self.table, e);
                    return Err(BatchError::ItemWriter(format!("SQLite write failed: {}", e)));
                }
            }
        }

        Ok(())
    }
}

impl<O> TransactionManager for SqliteItemWriter<'_, O> {
    fn begin(&self) -> TransactionResult {
        if self.in_transaction() {
            return Err(BatchError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }

        let transaction = block_on(self.pool.begin())
            .map_err(|e| BatchError::Transaction(format!("unable to begin: {}", e)))?;
        self.transaction.replace(Some(transaction));

        Ok(())
    }

    fn commit(&self) -> TransactionResult {
        let transaction = self
            .transaction
            .take()
            .ok_or_else(|| BatchError::Transaction("no active transaction".to_string()))?;

        block_on(transaction.commit())
            .map_err(|e| BatchError::Transaction(format!("unable to commit: {}", e)))
    }

    fn rollback(&self) -> TransactionResult {
        match self.transaction.take() {
            Some(transaction) => block_on(transaction.rollback())
                .map_err(|e| BatchError::Transaction(format!("unable to roll back: {}", e))),
            None => Ok(()),
        }
    }
}

pub struct SqliteItemWriterBuilder<'a, O> {
    pool: Option<&'a Pool<Sqlite>>,
    table: Option<&'a str>,
    columns: Vec<&'a str>,
    item_binder: Option<&'a dyn DatabaseItemBinder<O, Sqlite>>,
}

impl<O> Default for SqliteItemWriterBuilder<'_, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, O> SqliteItemWriterBuilder<'a, O> {
    pub fn new() -> Self {
        Self {
            pool: None,
            table: None,
            columns: Vec::new(),
            item_binder: None,
        }
    }

    /// Pool the writer takes its connections and transactions from. Required.
    pub fn pool(mut self, pool: &'a Pool<Sqlite>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Table the rows are inserted into. Required.
    pub fn table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    /// Columns are bound in the order they are added.
    pub fn add_column(mut self, column: &'a str) -> Self {
        self.columns.push(column);
        self
    }

    pub fn item_binder(mut self, item_binder: &'a dyn DatabaseItemBinder<O, Sqlite>) -> Self {
        self.item_binder = Some(item_binder);
        self
    }

    pub fn build(self) -> Result<SqliteItemWriter<'a, O>, BatchError> {
        let missing = |what: &str| BatchError::Configuration(format!("{} is required", what));

        let pool = self.pool.ok_or_else(|| missing("a pool"))?;
        let table = self.table.ok_or_else(|| missing("a table"))?;
        let item_binder = self.item_binder.ok_or_else(|| missing("an item binder"))?;

        if self.columns.is_empty() {
            return Err(missing("at least one column"));
        }

        Ok(SqliteItemWriter {
            pool,
            table,
            columns: self.columns,
            item_binder,
            transaction: RefCell::new(None),
        })
    }
}
