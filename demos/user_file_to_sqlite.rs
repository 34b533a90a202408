//! Imports `demos/data/users.json` into a SQLite `users` table.
//!
//! `Elwyn.Skiles` is filtered out and `Maxime_Nienow` is rejected and skipped, so a single row
//! is inserted. Pass the path of a JSON step settings file to override the step configuration:
//!
//! ```text
//! cargo run --example user_file_to_sqlite --features json,rdbc-sqlite -- settings.json
//! ```
use std::env;

use anyhow::Result;
use log::info;
use serde::Deserialize;
use sqlx::{Sqlite, query_builder::Separated, sqlite::SqlitePoolOptions};

use chunk_batch::{
    BatchError, ErrorKind,
    core::{
        item::ItemProcessorResult,
        job::{Job, JobBuilder},
        settings::StepSettings,
        step::StepBuilder,
    },
    item::{
        json::JsonItemReaderBuilder,
        rdbc::{DatabaseItemBinder, SqliteItemWriterBuilder},
    },
};

#[derive(Debug, Clone, Deserialize)]
struct UserFile {
    id: i64,
    name: String,
    username: String,
}

#[derive(Debug, Clone)]
struct User {
    id: i64,
    name: String,
    username: String,
}

fn to_user(item: &UserFile) -> ItemProcessorResult<User> {
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

struct UserBinder;

impl DatabaseItemBinder<User, Sqlite> for UserBinder {
    fn bind(&self, item: &User, mut query_builder: Separated<Sqlite, &str>) {
        query_builder.push_bind(item.id);
        query_builder.push_bind(item.name.clone());
        query_builder.push_bind(item.username.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let settings = match env::args().nth(1) {
        Some(path) => StepSettings::from_path(path)?,
        None => StepSettings {
            name: Some("userStep".to_string()),
            fault_tolerant: true,
            skip_limit: 1,
            skip_on: vec![ErrorKind::InvalidItem],
            ..StepSettings::default()
        },
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::query("CREATE TABLE users (id BIGINT PRIMARY KEY, name TEXT, username TEXT)")
        .execute(&pool)
        .await?;

    let reader = JsonItemReaderBuilder::<UserFile>::new().from_path("demos/data/users.json")?;
    let binder = UserBinder;
    let writer = SqliteItemWriterBuilder::new()
        .pool(&pool)
        .table("users")
        .add_column("id")
        .add_column("name")
        .add_column("username")
        .item_binder(&binder)
        .build()?;

    let step = StepBuilder::unnamed()
        .chunk::<UserFile, User>(10)
        .settings(&settings)
        .reader(&reader)
        .processor(&to_user)
        .writer(&writer)
        .transaction_manager(&writer)
        .build()?;

    let job = JobBuilder::new().name("userJob").start(&step).build();
    let execution = job.run()?;

    for step_execution in &execution.step_executions {
        info!(
            "{}: read {}, filtered {}, skipped {}, written {}",
            step_execution.name,
            step_execution.read_count,
            step_execution.filter_count,
            step_execution.skip_count(),
            step_execution.write_count
        );
    }

    let usernames: Vec<String> = sqlx::query_scalar("SELECT username FROM users ORDER BY id")
        .fetch_all(&pool)
        .await?;
    println!("Imported users: {:?}", usernames);

    Ok(())
}
