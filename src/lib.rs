#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Chunk Batch for Rust

 Chunk-oriented batch steps: a reader pulls source records, an optional processor transforms,
 filters or rejects them, and a writer persists the result. Records are handled in chunks of a
 fixed size and every chunk is written inside its own transaction, so a chunk is either fully
 persisted or not at all.

 ## Core Concepts

- **Job:** an ordered list of steps. The job stops at the first failed step.
- **Step:** a chunk-oriented read, process, write loop with its own `StepExecution` ledger.
- **ItemReader:** hands out one record per call and `Ok(None)` once exhausted.
- **ItemProcessor:** maps a record. `Ok(None)` filters it out; an error rejects it.
- **ItemWriter:** persists one chunk.
- **TransactionManager:** the boundary begun, committed or rolled back around every chunk.
- **SkipPolicy:** decides whether a rejected record is skipped or fails the step. Fault
  tolerant steps skip `ErrorKind::InvalidItem` errors up to a skip limit.

 ## Features

| **Feature**   | **Description**                                                      |
|---------------|----------------------------------------------------------------------|
| json          | Enables a JSON array `ItemReader`                                    |
| http          | Enables an `ItemReader` fetching a JSON array over HTTP              |
| rdbc-sqlite   | Enables a transactional SQLite `ItemWriter`                          |
| mongodb       | Enables a MongoDB `ItemWriter`                                       |
| logger        | Enables a logger `ItemWriter`, useful for debugging purposes         |
| full          | Enables all available features                                       |

 ## Getting Started

```toml
[dependencies]
chunk-batch-rs = { version = "<version>", features = ["<full|json|http|rdbc-sqlite|mongodb|logger>"] }
```

```rust
# use chunk_batch::{
#     core::{
#         item::{ItemProcessor, ItemProcessorResult},
#         job::{Job, JobBuilder},
#         step::StepBuilder,
#     },
#     error::{BatchError, ErrorKind},
#     item::memory::{InMemoryItemReader, InMemoryItemWriter},
# };
#[derive(Debug, Clone, PartialEq)]
struct User {
    username: String,
}

struct UserProcessor;

impl ItemProcessor<String, User> for UserProcessor {
    fn process(&self, username: &String) -> ItemProcessorResult<User> {
        match username.as_str() {
            "Elwyn.Skiles" => Ok(None),
            "Maxime_Nienow" => Err(BatchError::invalid_item(username, "blacklisted")),
            _ => Ok(Some(User { username: username.clone() })),
        }
    }
}

fn main() -> Result<(), BatchError> {
    let reader = InMemoryItemReader::new(vec![
        "Bret".to_string(),
        "Elwyn.Skiles".to_string(),
        "Maxime_Nienow".to_string(),
    ]);
    let writer = InMemoryItemWriter::new();

    let step = StepBuilder::new("import-users")
        .chunk::<String, User>(10)
        .reader(&reader)
        .processor(&UserProcessor)
        .writer(&writer)
        .transaction_manager(&writer)
        .fault_tolerant()
        .skip(ErrorKind::InvalidItem)
        .skip_limit(1)
        .build()?;

    let job = JobBuilder::new().name("users").start(&step).build();
    let execution = job.run()?;

    let step_execution = execution.step_execution("import-users").unwrap();
    assert_eq!(step_execution.filter_count, 1);
    assert_eq!(step_execution.process_skip_count, 1);
    assert_eq!(writer.len(), 1);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of item readers and writers
pub mod item;
