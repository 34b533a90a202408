mod common;

use mockall::Sequence;

use chunk_batch::{
    BatchError,
    core::{
        item::{ItemProcessorResult, PassThroughProcessor},
        step::{Step, StepBuilder, StepExecution, StepStatus},
    },
    item::memory::InMemoryItemReader,
};

use common::{
    init_logger,
    mocks::{MockListener, MockTransactions, MockWriter},
    user,
};

fn users(count: i64) -> Vec<common::User> {
    (1..=count).map(|id| user(id, &format!("user{}", id))).collect()
}

fn lenient_writer() -> MockWriter {
    let mut writer = MockWriter::new();
    writer.expect_open().returning(|| Ok(()));
    writer.expect_flush().returning(|| Ok(()));
    writer.expect_close().returning(|| Ok(()));
    writer
}

#[test]
fn items_should_be_written_in_chunks_each_committed() {
    init_logger();

    let reader = InMemoryItemReader::new(users(25));

    let mut writer = lenient_writer();
    let mut sequence = Sequence::new();
    for size in [10, 10, 5] {
        writer
            .expect_write()
            .withf(move |items| items.len() == size)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
    }

    let mut transactions = MockTransactions::new();
    transactions.expect_begin().times(3).returning(|| Ok(()));
    transactions.expect_commit().times(3).returning(|| Ok(()));
    transactions.expect_rollback().never();

    let step = StepBuilder::new("userStep")
        .chunk::<common::User, common::User>(10)
        .reader(&reader)
        .processor(&PassThroughProcessor)
        .writer(&writer)
        .transaction_manager(&transactions)
        .build()
        .unwrap();

    let mut execution = StepExecution::new(step.get_name());
    step.execute(&mut execution).unwrap();

    assert_eq!(execution.status, StepStatus::Success);
    assert_eq!(execution.read_count, 25);
    assert_eq!(execution.write_count, 25);
    assert_eq!(execution.commit_count, 3);
}

#[test]
fn write_failure_should_roll_back_and_stop() {
    init_logger();

    let reader = InMemoryItemReader::new(users(15));

    let mut writer = lenient_writer();
    let mut sequence = Sequence::new();
    writer
        .expect_write()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    writer
        .expect_write()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Err(BatchError::ItemWriter("connection reset".to_string())));

    let mut transactions = MockTransactions::new();
    transactions.expect_begin().times(2).returning(|| Ok(()));
    transactions.expect_commit().times(1).returning(|| Ok(()));
    transactions.expect_rollback().times(1).returning(|| Ok(()));

    let step = StepBuilder::new("userStep")
        .chunk::<common::User, common::User>(10)
        .reader(&reader)
        .processor(&PassThroughProcessor)
        .writer(&writer)
        .transaction_manager(&transactions)
        .build()
        .unwrap();

    let mut execution = StepExecution::new(step.get_name());
    let result = step.execute(&mut execution);

    assert!(matches!(result, Err(BatchError::ItemWriter(_))));
    assert_eq!(execution.status, StepStatus::WriteError);
    assert_eq!(execution.write_count, 10);
    assert_eq!(execution.write_error_count, 5);
    assert_eq!(execution.commit_count, 1);
    assert_eq!(execution.rollback_count, 1);
}

#[test]
fn commit_failure_should_roll_back_and_not_count_writes() {
    init_logger();

    let reader = InMemoryItemReader::new(users(3));

    let mut writer = lenient_writer();
    writer.expect_write().times(1).returning(|_| Ok(()));

    let mut transactions = MockTransactions::new();
    transactions.expect_begin().times(1).returning(|| Ok(()));
    transactions
        .expect_commit()
        .times(1)
        .returning(|| Err(BatchError::Transaction("deadlock detected".to_string())));
    transactions.expect_rollback().times(1).returning(|| Ok(()));

    let step = StepBuilder::new("userStep")
        .chunk::<common::User, common::User>(10)
        .reader(&reader)
        .processor(&PassThroughProcessor)
        .writer(&writer)
        .transaction_manager(&transactions)
        .build()
        .unwrap();

    let mut execution = StepExecution::new(step.get_name());
    let result = step.execute(&mut execution);

    assert!(matches!(result, Err(BatchError::Transaction(_))));
    assert_eq!(execution.status, StepStatus::TransactionError);
    assert_eq!(execution.write_count, 0);
    assert_eq!(execution.commit_count, 0);
    assert_eq!(execution.rollback_count, 1);
}

#[test]
fn begin_failure_should_stop_before_writing() {
    init_logger();

    let reader = InMemoryItemReader::new(users(3));

    let mut writer = lenient_writer();
    writer.expect_write().never();

    let mut transactions = MockTransactions::new();
    transactions
        .expect_begin()
        .times(1)
        .returning(|| Err(BatchError::Transaction("pool exhausted".to_string())));
    transactions.expect_commit().never();
    transactions.expect_rollback().never();

    let mut listener = MockListener::new();
    listener.expect_before_chunk().times(1).return_const(());
    listener
        .expect_after_chunk_error()
        .withf(|error| matches!(error, BatchError::Transaction(_)))
        .times(1)
        .return_const(());
    listener.expect_after_chunk().never();

    let step = StepBuilder::new("userStep")
        .chunk::<common::User, common::User>(10)
        .reader(&reader)
        .processor(&PassThroughProcessor)
        .writer(&writer)
        .transaction_manager(&transactions)
        .chunk_listener(&listener)
        .build()
        .unwrap();

    let mut execution = StepExecution::new(step.get_name());
    let result = step.execute(&mut execution);

    assert!(matches!(result, Err(BatchError::Transaction(_))));
    assert_eq!(execution.status, StepStatus::TransactionError);
    assert_eq!(execution.read_count, 3);
    assert_eq!(execution.rollback_count, 0);
}

#[test]
fn fully_filtered_chunk_should_commit_without_writing() {
    init_logger();

    let reader = InMemoryItemReader::new(users(3));
    let filter_all = |_: &common::User| -> ItemProcessorResult<common::User> { Ok(None) };

    let mut writer = MockWriter::new();
    writer.expect_open().times(1).returning(|| Ok(()));
    writer.expect_write().never();
    writer.expect_flush().never();
    writer.expect_close().times(1).returning(|| Ok(()));

    let mut transactions = MockTransactions::new();
    transactions.expect_begin().times(1).returning(|| Ok(()));
    transactions.expect_commit().times(1).returning(|| Ok(()));
    transactions.expect_rollback().never();

    let mut listener = MockListener::new();
    listener.expect_before_chunk().times(1).return_const(());
    listener
        .expect_after_chunk()
        .withf(|items| items.is_empty())
        .times(1)
        .return_const(());
    listener.expect_after_chunk_error().never();

    let step = StepBuilder::new("userStep")
        .chunk::<common::User, common::User>(10)
        .reader(&reader)
        .processor(&filter_all)
        .writer(&writer)
        .transaction_manager(&transactions)
        .chunk_listener(&listener)
        .build()
        .unwrap();

    let mut execution = StepExecution::new(step.get_name());
    step.execute(&mut execution).unwrap();

    assert_eq!(execution.status, StepStatus::Success);
    assert_eq!(execution.read_count, 3);
    assert_eq!(execution.filter_count, 3);
    assert_eq!(execution.write_count, 0);
    assert_eq!(execution.commit_count, 1);
}

#[test]
fn open_failure_should_fail_without_reading() {
    init_logger();

    let reader = InMemoryItemReader::new(users(3));

    let mut writer = MockWriter::new();
    writer
        .expect_open()
        .returning(|| Err(BatchError::ItemWriter("table users is missing".to_string())));
    writer.expect_write().never();
    writer.expect_close().never();

    let step = StepBuilder::new("userStep")
        .chunk::<common::User, common::User>(10)
        .reader(&reader)
        .processor(&PassThroughProcessor)
        .writer(&writer)
        .build()
        .unwrap();

    let mut execution = StepExecution::new(step.get_name());
    let result = step.execute(&mut execution);

    assert!(result.is_err());
    assert_eq!(execution.status, StepStatus::WriteError);
    assert_eq!(execution.read_count, 0);
    assert_eq!(reader.remaining(), 3);
}

#[test]
fn failing_close_should_not_fail_the_step() {
    init_logger();

    let reader = InMemoryItemReader::new(users(2));

    let mut writer = MockWriter::new();
    writer.expect_open().returning(|| Ok(()));
    writer.expect_write().times(1).returning(|_| Ok(()));
    writer.expect_flush().times(1).returning(|| Ok(()));
    writer
        .expect_close()
        .times(1)
        .returning(|| Err(BatchError::ItemWriter("already closed".to_string())));

    let step = StepBuilder::new("userStep")
        .chunk::<common::User, common::User>(10)
        .reader(&reader)
        .processor(&PassThroughProcessor)
        .writer(&writer)
        .build()
        .unwrap();

    let mut execution = StepExecution::new(step.get_name());

    assert!(step.execute(&mut execution).is_ok());
    assert_eq!(execution.status, StepStatus::Success);
    assert_eq!(execution.write_count, 2);
}
