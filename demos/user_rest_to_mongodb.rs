//! Copies the users served by a JSON REST endpoint into a MongoDB collection.
//!
//! ```text
//! USERS_API=https://jsonplaceholder.typicode.com MONGODB_URI=mongodb://127.0.0.1:27017 \
//!     cargo run --example user_rest_to_mongodb --features http,mongodb
//! ```
use std::env;

use anyhow::Result;
use mongodb::{bson::doc, sync::Client};
use serde::{Deserialize, Serialize};

use chunk_batch::{
    core::{
        job::{Job, JobBuilder},
        step::StepBuilder,
    },
    item::{http::HttpJsonRepositoryBuilder, mongodb::MongodbItemWriterBuilder},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
    username: String,
    email: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let api = env::var("USERS_API")
        .unwrap_or_else(|_| "https://jsonplaceholder.typicode.com".to_string());
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://127.0.0.1:27017".to_string());

    let client = Client::with_uri_str(&uri)?;
    let collection = client.database("test").collection::<User>("users");

    let reader = HttpJsonRepositoryBuilder::<User>::new()
        .base_url(api)
        .path("/users")
        .token(env::var("USERS_API_TOKEN").ok())
        .build_reader()?;
    let writer = MongodbItemWriterBuilder::new()
        .collection(&collection)
        .build()?;

    let step = StepBuilder::new("userStep")
        .pass_through_chunk::<User>(10)
        .reader(&reader)
        .writer(&writer)
        .build()?;

    let job = JobBuilder::new().name("userJob").start(&step).build();
    job.run()?;

    println!(
        "{} users in collection",
        collection.count_documents(doc! {}).run()?
    );

    Ok(())
}
