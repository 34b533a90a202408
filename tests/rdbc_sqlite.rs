mod common;

use std::fs;

use anyhow::Result;
use sqlx::{Sqlite, SqlitePool, query_builder::Separated, sqlite::SqlitePoolOptions};

use chunk_batch::{
    BatchError, ErrorKind,
    core::{
        job::{Job, JobBuilder},
        step::{Step, StepBuilder, StepExecution, StepStatus},
    },
    item::{
        http::HttpJsonRepositoryBuilder,
        json::JsonItemReaderBuilder,
        rdbc::{DatabaseItemBinder, SqliteItemWriterBuilder},
    },
};

use common::{HttpStub, User, UserFile, init_logger, to_user};

struct UserBinder;

impl DatabaseItemBinder<User, Sqlite> for UserBinder {
    fn bind(&self, item: &User, mut query_builder: Separated<Sqlite, &str>) {
        query_builder.push_bind(item.id);
        query_builder.push_bind(item.name.clone());
        query_builder.push_bind(item.username.clone());
    }
}

async fn prepare_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("CREATE TABLE IF NOT EXISTS users (id BIGINT PRIMARY KEY, name TEXT, username TEXT)")
        .execute(&pool)
        .await?;

    Ok(pool)
}

async fn exists_by_username(pool: &SqlitePool, username: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT * FROM users WHERE username = ?)")
            .bind(username)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

async fn count_users(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?)
}

#[tokio::test(flavor = "multi_thread")]
async fn skipped_users_should_not_be_inserted() -> Result<()> {
    init_logger();
    let pool = prepare_database().await?;

    let reader = JsonItemReaderBuilder::<UserFile>::new().from_path("tests/data/users.json")?;
    let binder = UserBinder;
    let writer = SqliteItemWriterBuilder::new()
        .pool(&pool)
        .table("users")
        .add_column("id")
        .add_column("name")
        .add_column("username")
        .item_binder(&binder)
        .build()?;

    let step = StepBuilder::new("userStep")
        .chunk::<UserFile, User>(10)
        .reader(&reader)
        .processor(&to_user)
        .writer(&writer)
        .transaction_manager(&writer)
        .fault_tolerant()
        .skip(ErrorKind::InvalidItem)
        .skip_limit(1)
        .build()?;

    let job = JobBuilder::new().name("userJob").start(&step).build();
    let execution = job.run()?;

    assert!(!writer.in_transaction());
    assert!(!exists_by_username(&pool, "Elwyn.Skiles").await?);
    assert!(!exists_by_username(&pool, "Maxime_Nienow").await?);
    assert!(exists_by_username(&pool, "Bret").await?);
    assert_eq!(count_users(&pool).await?, 1);

    let step_execution = execution.step_execution("userStep").unwrap();
    assert_eq!(step_execution.write_count, 1);
    assert_eq!(step_execution.skip_count(), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_chunk_should_be_rolled_back() -> Result<()> {
    init_logger();
    let pool = prepare_database().await?;

    let reader =
        JsonItemReaderBuilder::<UserFile>::new().from_path("tests/data/jsonplaceholder-users.json")?;
    let binder = UserBinder;
    let writer = SqliteItemWriterBuilder::new()
        .pool(&pool)
        .table("users")
        .add_column("id")
        .add_column("name")
        .add_column("username")
        .item_binder(&binder)
        .build()?;

    // the second chunk [Kamren..Maxime_Nienow] fails on Maxime_Nienow, no skip being allowed
    let step = StepBuilder::new("userStep")
        .chunk::<UserFile, User>(4)
        .reader(&reader)
        .processor(&to_user)
        .writer(&writer)
        .transaction_manager(&writer)
        .fault_tolerant()
        .skip_limit(0)
        .build()?;

    let mut execution = StepExecution::new(step.get_name());
    let result = step.execute(&mut execution);

    assert!(matches!(result, Err(BatchError::SkipLimitExceeded { limit: 0 })));
    assert_eq!(execution.status, StepStatus::ProcessorError);
    assert_eq!(execution.commit_count, 1);
    assert_eq!(execution.rollback_count, 1);
    assert_eq!(execution.write_count, 4);
    assert!(!writer.in_transaction());

    // only the first chunk [Bret..Karianne] is persisted
    assert_eq!(count_users(&pool).await?, 4);
    assert!(!exists_by_username(&pool, "Kamren").await?);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn write_failure_should_roll_back_the_whole_chunk() -> Result<()> {
    init_logger();
    let pool = prepare_database().await?;

    sqlx::query("INSERT INTO users (id, name, username) VALUES (2, 'Existing', 'Antonette')")
        .execute(&pool)
        .await?;

    let reader =
        JsonItemReaderBuilder::<UserFile>::new().from_path("tests/data/jsonplaceholder-users.json")?;
    let binder = UserBinder;
    let writer = SqliteItemWriterBuilder::new()
        .pool(&pool)
        .table("users")
        .add_column("id")
        .add_column("name")
        .add_column("username")
        .item_binder(&binder)
        .build()?;

    let step = StepBuilder::new("userStep")
        .chunk::<UserFile, User>(3)
        .reader(&reader)
        .processor(&to_user)
        .writer(&writer)
        .transaction_manager(&writer)
        .build()?;

    let mut execution = StepExecution::new(step.get_name());
    let result = step.execute(&mut execution);

    assert!(matches!(result, Err(BatchError::ItemWriter(_))));
    assert_eq!(execution.status, StepStatus::WriteError);
    assert_eq!(execution.write_error_count, 3);
    assert_eq!(execution.rollback_count, 1);
    assert_eq!(execution.commit_count, 0);

    // neither Bret nor Samantha from the failed chunk made it
    assert_eq!(count_users(&pool).await?, 1);
    assert!(!exists_by_username(&pool, "Bret").await?);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn users_from_the_endpoint_should_be_inserted_inside_the_runtime() -> Result<()> {
    init_logger();
    let pool = prepare_database().await?;
    let body = fs::read_to_string("tests/data/jsonplaceholder-users.json")?;
    let stub = HttpStub::serve(200, &body);

    let reader = HttpJsonRepositoryBuilder::<User>::new()
        .base_url(stub.base_url())
        .path("/users")
        .build_reader()?;
    let binder = UserBinder;
    let writer = SqliteItemWriterBuilder::new()
        .pool(&pool)
        .table("users")
        .add_column("id")
        .add_column("name")
        .add_column("username")
        .item_binder(&binder)
        .build()?;

    let step = StepBuilder::new("userStep")
        .pass_through_chunk::<User>(4)
        .reader(&reader)
        .writer(&writer)
        .transaction_manager(&writer)
        .build()?;

    let job = JobBuilder::new().name("userJob").start(&step).build();
    let execution = job.run()?;

    assert_eq!(count_users(&pool).await?, 10);
    assert!(exists_by_username(&pool, "Moriah.Stanton").await?);

    let step_execution = execution.step_execution("userStep").unwrap();
    assert_eq!(step_execution.read_count, 10);
    assert_eq!(step_execution.commit_count, 3);
    assert_eq!(stub.requests().len(), 1);

    Ok(())
}
