use sqlx::{Database, query_builder::Separated};

/// SQLite writer joining the chunk transaction.
pub mod sqlite_writer;

/// Binds the fields of an item to the placeholders of one `VALUES` row.
///
/// Values must be pushed in the order the writer's columns were declared.
///
/// ```
/// use chunk_batch::item::rdbc::DatabaseItemBinder;
/// use sqlx::{query_builder::Separated, Sqlite};
///
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// struct UserBinder;
///
/// impl DatabaseItemBinder<User, Sqlite> for UserBinder {
///     fn bind(&self, item: &User, mut query_builder: Separated<Sqlite, &str>) {
///         query_builder.push_bind(item.id);
///         query_builder.push_bind(item.username.clone());
///     }
/// }
/// ```
pub trait DatabaseItemBinder<O, DB: Database> {
    fn bind(&self, item: &O, query_builder: Separated<DB, &str>);
}

pub use sqlite_writer::{SqliteItemWriter, SqliteItemWriterBuilder};
