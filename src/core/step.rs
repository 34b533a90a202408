use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{BatchError, ErrorKind};

use super::{
    build_name,
    item::{ItemProcessor, ItemReader, ItemWriter, PassThroughProcessor},
    listener::{ChunkListener, SkipListener},
    settings::StepSettings,
    skip::{LimitCheckingSkipPolicy, NeverSkipPolicy, SkipPolicy},
    transaction::{ResourcelessTransactionManager, TransactionManager},
};

const DEFAULT_CHUNK_SIZE: usize = 10;

/// Outcome of reading one chunk.
#[derive(Debug, PartialEq)]
pub enum ChunkStatus {
    /// The chunk holds `chunk_size` items and the reader may have more.
    Full,
    /// The reader is exhausted. The chunk may still hold items.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Starting,
    Started,
    Success,
    ReadError,
    ProcessorError,
    WriteError,
    TransactionError,
}

/// Ledger of one step run.
#[derive(Debug, Clone)]
pub struct StepExecution {
    /// Unique identifier for this step execution
    pub id: Uuid,
    /// Human-readable name for the step
    pub name: String,
    /// Current status of the step execution
    pub status: StepStatus,
    pub start_time: Instant,
    pub end_time: Instant,
    pub duration: Duration,
    /// Number of items successfully read
    pub read_count: usize,
    /// Number of items the processor filtered out by returning `None`
    pub filter_count: usize,
    /// Number of items left out because of a skippable processor error
    pub process_skip_count: usize,
    /// Number of items written in committed chunks
    pub write_count: usize,
    /// Number of committed chunks
    pub commit_count: usize,
    /// Number of rolled back chunks
    pub rollback_count: usize,
    /// Number of errors encountered during reading
    pub read_error_count: usize,
    /// Number of errors encountered during processing, skipped or not
    pub process_error_count: usize,
    /// Number of items in chunks whose write failed
    pub write_error_count: usize,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: StepStatus::Starting,
            start_time: now,
            end_time: now,
            duration: Duration::ZERO,
            read_count: 0,
            filter_count: 0,
            process_skip_count: 0,
            write_count: 0,
            commit_count: 0,
            rollback_count: 0,
            read_error_count: 0,
            process_error_count: 0,
            write_error_count: 0,
        }
    }

    /// Total number of items left out of the output because of an error.
    pub fn skip_count(&self) -> usize {
        self.process_skip_count
    }
}

/// An independent, sequential phase of a job.
pub trait Step {
    fn get_name(&self) -> &str;

    /// Executes the step, recording progress into `step_execution`.
    ///
    /// # Returns
    /// - `Ok(())`: the step completed successfully
    /// - `Err(BatchError)`: the step failed; `step_execution.status` tells at which stage
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError>;
}

/// Reads, processes and writes items in chunks of `chunk_size`, one transaction per chunk.
pub struct ChunkOrientedStep<'a, I, O> {
    name: String,
    /// Component responsible for reading items from the source
    reader: &'a dyn ItemReader<I>,
    /// Component responsible for processing items
    processor: &'a dyn ItemProcessor<I, O>,
    /// Component responsible for writing items to the destination
    writer: &'a dyn ItemWriter<O>,
    transaction_manager: &'a dyn TransactionManager,
    /// Number of items to process in each chunk
    chunk_size: usize,
    skip_policy: Box<dyn SkipPolicy + 'a>,
    chunk_listeners: Vec<&'a dyn ChunkListener<O>>,
    skip_listeners: Vec<&'a dyn SkipListener<I>>,
}

impl<I, O> Step for ChunkOrientedStep<'_, I, O> {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        let start_time = Instant::now();
        step_execution.start_time = start_time;
        step_execution.status = StepStatus::Started;

        info!(
            "Start of step: {}, id: {}",
            step_execution.name, step_execution.id
        );

        let result = match self.writer.open() {
            Ok(()) => {
                let result = self.run_chunks(step_execution);
                Self::manage_error(self.writer.close());
                result
            }
            Err(error) => {
                step_execution.status = StepStatus::WriteError;
                Err(error)
            }
        };

        step_execution.end_time = Instant::now();
        step_execution.duration = start_time.elapsed();

        match &result {
            Ok(()) => info!(
                "End of step: {}, id: {}, read: {}, written: {}, filtered: {}, skipped: {}",
                step_execution.name,
                step_execution.id,
                step_execution.read_count,
                step_execution.write_count,
                step_execution.filter_count,
                step_execution.process_skip_count
            ),
            Err(err) => error!(
                "Step {} failed with status {:?}: {}",
                step_execution.name, step_execution.status, err
            ),
        }

        result
    }
}

impl<I, O> ChunkOrientedStep<'_, I, O> {
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn run_chunks(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        loop {
            let (read_items, chunk_status) = match self.read_chunk(step_execution) {
                Ok(chunk) => chunk,
                Err(error) => {
                    step_execution.status = StepStatus::ReadError;
                    return Err(error);
                }
            };

            if !read_items.is_empty() {
                self.execute_chunk(step_execution, &read_items)?;
            }

            if chunk_status == ChunkStatus::Finished {
                step_execution.status = StepStatus::Success;
                return Ok(());
            }
        }
    }

    /// Reads up to `chunk_size` items. Read errors are fatal.
    fn read_chunk(
        &self,
        step_execution: &mut StepExecution,
    ) -> Result<(Vec<I>, ChunkStatus), BatchError> {
        debug!("Start reading chunk");

        let mut read_items = Vec::with_capacity(self.chunk_size);

        loop {
            match self.reader.read() {
                Ok(Some(item)) => {
                    read_items.push(item);
                    step_execution.read_count += 1;

                    if read_items.len() >= self.chunk_size {
                        debug!("End reading chunk: FULL");
                        return Ok((read_items, ChunkStatus::Full));
                    }
                }
                Ok(None) => {
                    debug!("End reading chunk: FINISHED");
                    return Ok((read_items, ChunkStatus::Finished));
                }
                Err(error) => {
                    error!("Error reading item: {}", error);
                    step_execution.read_error_count += 1;
                    return Err(error);
                }
            }
        }
    }

    /// Processes, writes and commits one chunk, rolling back on any failure.
    fn execute_chunk(
        &self,
        step_execution: &mut StepExecution,
        read_items: &[I],
    ) -> Result<(), BatchError> {
        self.chunk_listeners
            .iter()
            .for_each(|listener| listener.before_chunk());

        if let Err(error) = self.transaction_manager.begin() {
            step_execution.status = StepStatus::TransactionError;
            self.notify_chunk_error(&error);
            return Err(error);
        }

        let processed_items = match self
            .process_chunk(step_execution, read_items)
            .and_then(|items| self.write_chunk(step_execution, &items).map(|_| items))
        {
            Ok(items) => items,
            Err(error) => {
                self.rollback(step_execution, &error);
                return Err(error);
            }
        };

        if let Err(error) = self.transaction_manager.commit() {
            step_execution.status = StepStatus::TransactionError;
            self.rollback(step_execution, &error);
            return Err(error);
        }

        step_execution.commit_count += 1;
        step_execution.write_count += processed_items.len();
        debug!("Chunk committed with {} items", processed_items.len());

        self.chunk_listeners
            .iter()
            .for_each(|listener| listener.after_chunk(&processed_items));

        Ok(())
    }

    fn process_chunk(
        &self,
        step_execution: &mut StepExecution,
        read_items: &[I],
    ) -> Result<Vec<O>, BatchError> {
        debug!("Processing chunk of {} items", read_items.len());
        let mut result = Vec::with_capacity(read_items.len());

        for item in read_items {
            match self.processor.process(item) {
                Ok(Some(processed_item)) => result.push(processed_item),
                Ok(None) => {
                    debug!("Item filtered by processor");
                    step_execution.filter_count += 1;
                }
                Err(error) => {
                    step_execution.process_error_count += 1;

                    match self
                        .skip_policy
                        .should_skip(&error, step_execution.process_skip_count)
                    {
                        Ok(true) => {
                            warn!("Skipping item: {}", error);
                            step_execution.process_skip_count += 1;
                            self.skip_listeners
                                .iter()
                                .for_each(|listener| listener.on_skip_in_process(item, &error));
                        }
                        Ok(false) => {
                            error!("Error processing item: {}", error);
                            step_execution.status = StepStatus::ProcessorError;
                            return Err(error);
                        }
                        Err(limit_error) => {
                            error!("{} while processing item: {}", limit_error, error);
                            step_execution.status = StepStatus::ProcessorError;
                            return Err(limit_error);
                        }
                    }
                }
            }
        }

        Ok(result)
    }

    fn write_chunk(
        &self,
        step_execution: &mut StepExecution,
        processed_items: &[O],
    ) -> Result<(), BatchError> {
        if processed_items.is_empty() {
            debug!("No items to write, skipping write call");
            return Ok(());
        }

        debug!("Writing chunk of {} items", processed_items.len());

        let result = self
            .writer
            .write(processed_items)
            .and_then(|()| self.writer.flush());

        if let Err(error) = result {
            error!("Error writing items: {}", error);
            step_execution.write_error_count += processed_items.len();
            step_execution.status = StepStatus::WriteError;
            return Err(error);
        }

        Ok(())
    }

    fn rollback(&self, step_execution: &mut StepExecution, cause: &BatchError) {
        debug!("Rolling back chunk: {}", cause);
        step_execution.rollback_count += 1;

        if let Err(error) = self.transaction_manager.rollback() {
            error!("Rollback failed: {}", error);
        }

        self.notify_chunk_error(cause);
    }

    fn notify_chunk_error(&self, error: &BatchError) {
        self.chunk_listeners
            .iter()
            .for_each(|listener| listener.after_chunk_error(error));
    }

    fn manage_error(result: Result<(), BatchError>) {
        if let Err(error) = result {
            warn!("Non-fatal error: {}", error);
        }
    }
}

/// Builder for a [`ChunkOrientedStep`].
///
/// Fault tolerance is opt-in. Without [`fault_tolerant`](Self::fault_tolerant) or a custom
/// [`skip_policy`](Self::skip_policy), the first processor error fails the step.
pub struct ChunkOrientedStepBuilder<'a, I, O> {
    name: String,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ItemWriter<O>>,
    transaction_manager: Option<&'a dyn TransactionManager>,
    chunk_size: usize,
    fault_tolerant: bool,
    skip_limit: usize,
    skippable: Vec<ErrorKind>,
    skip_policy: Option<Box<dyn SkipPolicy + 'a>>,
    chunk_listeners: Vec<&'a dyn ChunkListener<O>>,
    skip_listeners: Vec<&'a dyn SkipListener<I>>,
}

impl<'a, I, O> ChunkOrientedStepBuilder<'a, I, O> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reader: None,
            processor: None,
            writer: None,
            transaction_manager: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            fault_tolerant: false,
            skip_limit: 0,
            skippable: Vec::new(),
            skip_policy: None,
            chunk_listeners: Vec::new(),
            skip_listeners: Vec::new(),
        }
    }

    /// Source of the items. Required.
    pub fn reader(mut self, reader: &'a dyn ItemReader<I>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Sets the processor. Steps built with [`StepBuilder::pass_through_chunk`] start with a
    /// [`PassThroughProcessor`], which this replaces.
    pub fn processor(mut self, processor: &'a dyn ItemProcessor<I, O>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Destination of every chunk. Required.
    pub fn writer(mut self, writer: &'a dyn ItemWriter<O>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Defaults to [`ResourcelessTransactionManager`].
    pub fn transaction_manager(mut self, transaction_manager: &'a dyn TransactionManager) -> Self {
        self.transaction_manager = Some(transaction_manager);
        self
    }

    /// Number of items read before a chunk is written and committed. Must be at least 1.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Lets the step skip processor errors of the skippable kinds, up to the skip limit.
    pub fn fault_tolerant(mut self) -> Self {
        self.fault_tolerant = true;
        self
    }

    /// Designates an error kind as skippable. Without any, fault tolerant steps skip
    /// [`ErrorKind::InvalidItem`].
    pub fn skip(mut self, kind: ErrorKind) -> Self {
        if !self.skippable.contains(&kind) {
            self.skippable.push(kind);
        }
        self
    }

    /// Maximum number of skipped items. `0` skips nothing.
    pub fn skip_limit(mut self, skip_limit: usize) -> Self {
        self.skip_limit = skip_limit;
        self
    }

    /// Replaces the limit checking policy built from `skip` and `skip_limit`.
    pub fn skip_policy(mut self, skip_policy: impl SkipPolicy + 'a) -> Self {
        self.skip_policy = Some(Box::new(skip_policy));
        self
    }

    pub fn chunk_listener(mut self, listener: &'a dyn ChunkListener<O>) -> Self {
        self.chunk_listeners.push(listener);
        self
    }

    pub fn skip_listener(mut self, listener: &'a dyn SkipListener<I>) -> Self {
        self.skip_listeners.push(listener);
        self
    }

    /// Applies externalised settings on top of the current configuration.
    pub fn settings(mut self, settings: &StepSettings) -> Self {
        if let Some(name) = &settings.name {
            self.name = name.clone();
        }
        self.chunk_size = settings.chunk_size;
        self.fault_tolerant = settings.fault_tolerant;
        self.skip_limit = settings.skip_limit;
        self.skippable = settings.skip_on.clone();
        self
    }

    pub fn build(self) -> Result<ChunkOrientedStep<'a, I, O>, BatchError> {
        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(format!(
                "step {}: chunk size must be at least 1",
                self.name
            )));
        }

        let reader = self.reader.ok_or_else(|| {
            BatchError::Configuration(format!("step {}: a reader is required", self.name))
        })?;
        let processor = self.processor.ok_or_else(|| {
            BatchError::Configuration(format!(
                "step {}: a processor is required unless the step is a pass-through chunk",
                self.name
            ))
        })?;
        let writer = self.writer.ok_or_else(|| {
            BatchError::Configuration(format!("step {}: a writer is required", self.name))
        })?;

        let skip_policy: Box<dyn SkipPolicy + 'a> = match self.skip_policy {
            Some(skip_policy) => skip_policy,
            None if self.fault_tolerant => {
                let kinds = if self.skippable.is_empty() {
                    vec![ErrorKind::InvalidItem]
                } else {
                    self.skippable
                };
                let policy = kinds
                    .into_iter()
                    .fold(LimitCheckingSkipPolicy::new(self.skip_limit), |policy, kind| {
                        policy.skip_on(kind)
                    });
                Box::new(policy)
            }
            None => Box::new(NeverSkipPolicy),
        };

        Ok(ChunkOrientedStep {
            name: self.name,
            reader,
            processor,
            writer,
            transaction_manager: self
                .transaction_manager
                .unwrap_or(&ResourcelessTransactionManager),
            chunk_size: self.chunk_size,
            skip_policy,
            chunk_listeners: self.chunk_listeners,
            skip_listeners: self.skip_listeners,
        })
    }
}

/// Entry point for building steps.
///
/// ```
/// use chunk_batch::core::step::{Step, StepBuilder, StepExecution, StepStatus};
/// use chunk_batch::item::memory::{InMemoryItemReader, InMemoryItemWriter};
///
/// let reader = InMemoryItemReader::new(vec![1, 2, 3]);
/// let writer = InMemoryItemWriter::new();
///
/// let step = StepBuilder::new("numbers")
///     .pass_through_chunk::<i32>(2)
///     .reader(&reader)
///     .writer(&writer)
///     .transaction_manager(&writer)
///     .build()
///     .unwrap();
///
/// let mut execution = StepExecution::new(step.get_name());
/// step.execute(&mut execution).unwrap();
///
/// assert_eq!(execution.status, StepStatus::Success);
/// assert_eq!(execution.commit_count, 2);
/// assert_eq!(writer.items(), vec![1, 2, 3]);
/// ```
pub struct StepBuilder {
    name: String,
}

impl StepBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// A step with a generated name.
    pub fn unnamed() -> Self {
        Self { name: build_name() }
    }

    pub fn chunk<'a, I, O>(self, chunk_size: usize) -> ChunkOrientedStepBuilder<'a, I, O> {
        ChunkOrientedStepBuilder::new(&self.name).chunk_size(chunk_size)
    }

    /// A chunk step whose items are written as read, so no processor has to be set.
    pub fn pass_through_chunk<'a, T: Clone>(
        self,
        chunk_size: usize,
    ) -> ChunkOrientedStepBuilder<'a, T, T> {
        self.chunk(chunk_size).processor(&PassThroughProcessor)
    }
}
