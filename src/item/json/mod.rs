/// JSON support for reading structured data.
///
/// [`JsonItemReader`] reads a top-level JSON array from a file, a string or any source
/// implementing `Read`, handing out one deserialized element per `read`.
///
/// # Examples
///
/// ```
/// use chunk_batch::item::json::json_reader::JsonItemReaderBuilder;
/// use chunk_batch::core::item::ItemReader;
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct User {
///     id: u64,
///     name: String,
///     username: String,
/// }
///
/// let json_data = r#"[
///   { "id": 1, "name": "Leanne Graham", "username": "Bret", "email": "Sincere@april.biz" },
///   { "id": 2, "name": "Ervin Howell", "username": "Antonette", "email": "Shanna@melissa.tv" }
/// ]"#;
///
/// let reader = JsonItemReaderBuilder::<User>::new().from_reader(Cursor::new(json_data));
///
/// let mut users = Vec::new();
/// while let Some(user) = reader.read().unwrap() {
///     users.push(user);
/// }
///
/// assert_eq!(users.len(), 2);
/// assert_eq!(users[0].username, "Bret");
/// assert_eq!(users[1].name, "Ervin Howell");
/// ```
pub mod json_reader;

pub use json_reader::{JsonItemReader, JsonItemReaderBuilder};
