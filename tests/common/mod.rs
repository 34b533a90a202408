#![allow(dead_code)]

pub mod http_stub;
pub mod mocks;

use serde::{Deserialize, Serialize};

use chunk_batch::{BatchError, core::item::ItemProcessorResult};

pub use http_stub::HttpStub;

/// A record as published by the user directory. Unknown fields such as `email` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UserFile {
    pub id: i64,
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
}

/// Drops `Elwyn.Skiles` and rejects `Maxime_Nienow`.
pub fn to_user(item: &UserFile) -> ItemProcessorResult<User> {
    match item.username.as_str() {
        "Elwyn.Skiles" => Ok(None),
        "Maxime_Nienow" => Err(BatchError::invalid_item(
            &item.username,
            format!("Username {} is not allowed", item.username),
        )),
        _ => Ok(Some(User {
            id: item.id,
            name: item.name.clone(),
            username: item.username.clone(),
        })),
    }
}

pub fn user(id: i64, username: &str) -> User {
    User {
        id,
        name: format!("User {}", id),
        username: username.to_string(),
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
