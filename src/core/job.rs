use std::time::{Duration, Instant};

use log::{error, info};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    step::{Step, StepExecution},
};

/// Type alias for job execution results.
///
/// A `JobResult` is a `Result` that contains either:
/// - A successful `JobExecution` with execution details
/// - A `BatchError::Step` naming the failed step and wrapping its cause
pub type JobResult<T> = Result<T, BatchError>;

/// Represents a job that can be executed.
///
/// A job is a container for a sequence of steps that are executed in order. The job stops at
/// the first failed step; later steps are not executed.
pub trait Job {
    /// Runs the job and reports its execution, whether it completed or failed.
    ///
    /// A failed execution has the status [`BatchStatus::Failed`], holds the ledgers of every
    /// step that ran, the failed one last, and carries the error in `failure`.
    fn execute(&self) -> JobExecution;

    /// Runs the job and returns the result of the job execution.
    ///
    /// # Returns
    /// - `Ok(JobExecution)` when every step succeeds
    /// - `Err(BatchError::Step)` when a step fails
    fn run(&self) -> JobResult<JobExecution> {
        let mut execution = self.execute();
        match execution.failure.take() {
            Some(error) => Err(error),
            None => Ok(execution),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// The job has successfully completed its execution.
    Completed,
    /// The job has failed during its execution.
    Failed,
}

/// Represents the execution of a job.
#[derive(Debug)]
pub struct JobExecution {
    pub id: Uuid,
    pub name: String,
    pub status: BatchStatus,
    /// The time when the job started executing
    pub start: Instant,
    /// The time when the job finished executing
    pub end: Instant,
    /// The total duration of the job execution
    pub duration: Duration,
    /// One entry per step run, in execution order
    pub step_executions: Vec<StepExecution>,
    /// `BatchError::Step` naming the step that failed the job
    pub failure: Option<BatchError>,
}

impl JobExecution {
    pub fn step_execution(&self, name: &str) -> Option<&StepExecution> {
        self.step_executions.iter().find(|step| step.name == name)
    }
}

/// Represents an instance of a job.
///
/// A job instance is created through the `JobBuilder` and executed by calling
/// the `run` method. The steps are executed in the order they were added.
pub struct JobInstance<'a> {
    /// Unique identifier for this job instance
    id: Uuid,
    /// Human-readable name for the job
    name: String,
    /// Collection of steps that make up this job, in execution order
    steps: Vec<&'a dyn Step>,
}

impl JobInstance<'_> {
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

impl Job for JobInstance<'_> {
    fn execute(&self) -> JobExecution {
        let start = Instant::now();

        info!("Start of job: {}, id: {}", self.name, self.id);

        let mut step_executions = Vec::with_capacity(self.steps.len());
        let mut failure = None;

        for step in &self.steps {
            let mut step_execution = StepExecution::new(step.get_name());
            let result = step.execute(&mut step_execution);
            step_executions.push(step_execution);

            if let Err(source) = result {
                error!(
                    "Job {} failed at step {}: {}",
                    self.name,
                    step.get_name(),
                    source
                );
                failure = Some(BatchError::Step {
                    name: step.get_name().to_owned(),
                    source: Box::new(source),
                });
                break;
            }
        }

        let status = if failure.is_some() {
            BatchStatus::Failed
        } else {
            info!("End of job: {}, id: {}", self.name, self.id);
            BatchStatus::Completed
        };

        JobExecution {
            id: self.id,
            name: self.name.clone(),
            status,
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            step_executions,
            failure,
        }
    }
}

/// Builder for creating a job instance.
///
/// ```
/// use chunk_batch::core::item::PassThroughProcessor;
/// use chunk_batch::core::job::{BatchStatus, Job, JobBuilder};
/// use chunk_batch::core::step::StepBuilder;
/// use chunk_batch::item::memory::{InMemoryItemReader, InMemoryItemWriter};
///
/// let reader = InMemoryItemReader::new(vec!["Bret".to_string(), "Antonette".to_string()]);
/// let writer = InMemoryItemWriter::new();
///
/// let step = StepBuilder::new("userStep")
///     .chunk::<String, String>(10)
///     .reader(&reader)
///     .processor(&PassThroughProcessor)
///     .writer(&writer)
///     .build()
///     .unwrap();
///
/// let job = JobBuilder::new().name("userJob").start(&step).build();
/// let execution = job.run().unwrap();
///
/// assert_eq!(execution.status, BatchStatus::Completed);
/// assert_eq!(execution.step_execution("userStep").unwrap().write_count, 2);
/// ```
#[derive(Default)]
pub struct JobBuilder<'a> {
    /// Optional name for the job (generated randomly if not specified)
    name: Option<String>,
    /// Collection of steps to be executed, in order
    steps: Vec<&'a dyn Step>,
}

impl<'a> JobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            steps: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> JobBuilder<'a> {
        self.name = Some(name.into());
        self
    }

    /// Sets the first step of the job. Same as `next`, reads better for the first step.
    pub fn start(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    pub fn next(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// If no name has been provided, a random name is generated.
    pub fn build(self) -> JobInstance<'a> {
        JobInstance {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            steps: self.steps,
        }
    }
}
