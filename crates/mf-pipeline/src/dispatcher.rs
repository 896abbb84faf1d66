//! Batch dispatcher: validates a batch, fans the jobs out to the registered
//! converter with bounded concurrency, and aggregates the outcomes.
//!
//! A batch either fails up front with a [`ConfigurationError`] (nothing is
//! written, no progress is emitted) or runs every job to an outcome. One
//! job's failure never stops the others.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mf_core::config::ConversionConfig;
use mf_core::{ConfigurationError, ConversionError, MediaKind, OutputFormat};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::converter::{Converter, ConverterRegistry};
use crate::progress::ProgressReporter;
use crate::worklist::Job;

/// Outcome of one job.
#[derive(Debug)]
pub enum ConversionOutcome {
    Succeeded,
    Failed(ConversionError),
}

/// A job that failed, with the reason.
#[derive(Debug)]
pub struct JobFailure {
    pub job: Job,
    pub error: ConversionError,
}

/// Aggregate result of a batch.
///
/// `succeeded + failures.len() == total`, and `failures` keeps the input
/// job order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    /// Output paths of the successful jobs, in job order.
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<JobFailure>,
}

impl BatchResult {
    /// Whether every job succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of jobs that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// The jobs that failed, in order.
    pub fn failed_jobs(&self) -> impl Iterator<Item = &Job> {
        self.failures.iter().map(|f| &f.job)
    }
}

/// Destination for `source` converted to `format` inside `output_dir`:
/// the source's stem plus the format's extension.
///
/// Sources sharing a stem map to the same destination; the last one written
/// wins. The stem is copied byte for byte, so non-UTF-8 names survive.
pub fn output_path_for(source: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let mut name = match source.file_stem() {
        Some(stem) if !stem.is_empty() => stem.to_os_string(),
        _ => OsString::from("output"),
    };
    name.push(".");
    name.push(format.extension());
    output_dir.join(name)
}

/// Whether `output` already exists and is the same file as `input`.
fn overwrites_source(input: &Path, output: &Path) -> bool {
    match (std::fs::canonicalize(input), std::fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

/// Verify that `dir` exists, is a directory, and accepts new files.
pub fn check_output_folder(dir: &Path) -> Result<(), ConfigurationError> {
    if !dir.is_dir() {
        return Err(ConfigurationError::OutputFolderMissing {
            path: dir.to_path_buf(),
        });
    }

    // The test file is removed when dropped.
    tempfile::Builder::new()
        .prefix(".mediaforge-write-check")
        .tempfile_in(dir)
        .map(drop)
        .map_err(|source| ConfigurationError::OutputFolderNotWritable {
            path: dir.to_path_buf(),
            source,
        })
}

/// Runs batches of jobs against a [`ConverterRegistry`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ConverterRegistry>,
    max_concurrency: usize,
    progress: Arc<ProgressReporter>,
    cancellation: CancellationToken,
}

impl Dispatcher {
    /// Create a dispatcher with one worker per CPU and its own progress
    /// reporter.
    pub fn new(registry: ConverterRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            max_concurrency: ConversionConfig::default().effective_concurrency(),
            progress: Arc::new(ProgressReporter::new()),
            cancellation: CancellationToken::new(),
        }
    }

    /// Limit the number of jobs converting at once. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Share an existing progress reporter.
    pub fn with_progress(mut self, progress: Arc<ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Use `token` to stop jobs that have not started yet.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The reporter advanced by [`run_batch`](Self::run_batch).
    pub fn progress(&self) -> &Arc<ProgressReporter> {
        &self.progress
    }

    /// Cancel this token to stop jobs that are still waiting for a worker.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Upper bound on jobs converting at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Validate a batch without running it. Returns the converter to use.
    ///
    /// An empty batch is valid and needs no converter.
    pub fn validate(
        &self,
        jobs: &[Job],
        format: OutputFormat,
        output_dir: &Path,
    ) -> Result<Option<Arc<dyn Converter>>, ConfigurationError> {
        let Some(first) = jobs.first() else {
            return Ok(None);
        };
        let kind = first.kind();

        if let Some(other) = jobs.iter().find(|job| job.kind() != kind) {
            return Err(ConfigurationError::MixedKinds {
                expected: kind,
                found: other.kind(),
            });
        }

        check_format(kind, format)?;

        let converter = self
            .registry
            .get(kind)
            .ok_or(ConfigurationError::MissingConverter(kind))?;
        if !converter.supports(format) {
            return Err(ConfigurationError::FormatKindMismatch { format, kind });
        }

        check_output_folder(output_dir)?;

        Ok(Some(converter))
    }

    /// Convert every job to `format`, writing into `output_dir`.
    ///
    /// Progress is initialized to the batch size and advanced once per
    /// finished job, successful or not. Jobs still waiting for a worker when
    /// the cancellation token fires are recorded as
    /// [`ConversionError::Cancelled`]. A job whose destination is its own
    /// source file fails with [`ConversionError::OverwritesSource`] and the
    /// source is left alone.
    pub async fn run_batch(
        &self,
        jobs: &[Job],
        format: OutputFormat,
        output_dir: &Path,
    ) -> Result<BatchResult, ConfigurationError> {
        let Some(converter) = self.validate(jobs, format, output_dir)? else {
            return Ok(BatchResult::default());
        };

        let total = jobs.len();
        tracing::info!(
            "Converting {total} {} file(s) to {format} with {} (max {} at once)",
            jobs[0].kind(),
            converter.name(),
            self.max_concurrency
        );

        self.progress.init(total);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, job) in jobs.iter().enumerate() {
            let converter = Arc::clone(&converter);
            let semaphore = Arc::clone(&semaphore);
            let progress = Arc::clone(&self.progress);
            let token = self.cancellation.clone();
            let input = job.source_path().to_path_buf();
            let output = output_path_for(&input, output_dir, format);

            tasks.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ConversionError::Cancelled),
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(_permit) if token.is_cancelled() => Err(ConversionError::Cancelled),
                        Ok(_permit) if overwrites_source(&input, &output) => {
                            Err(ConversionError::OverwritesSource { path: output.clone() })
                        }
                        Ok(_permit) => {
                            tracing::debug!("Converting {:?} -> {:?}", input, output);
                            converter.convert(&input, &output, format).await
                        }
                        Err(e) => Err(ConversionError::Internal(e.to_string())),
                    },
                };

                progress.increment();
                (index, output, outcome)
            });
        }

        let mut slots: Vec<Option<(PathBuf, Result<(), ConversionError>)>> =
            (0..total).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, output, outcome)) => slots[index] = Some((output, outcome)),
                Err(e) => tracing::error!("Conversion worker panicked: {e}"),
            }
        }

        let mut result = BatchResult {
            total,
            ..Default::default()
        };

        for (job, slot) in jobs.iter().zip(slots) {
            let outcome = match slot {
                Some((output, Ok(()))) => {
                    result.outputs.push(output);
                    ConversionOutcome::Succeeded
                }
                Some((_, Err(error))) => ConversionOutcome::Failed(error),
                None => {
                    // The worker died before it could report.
                    self.progress.increment();
                    ConversionOutcome::Failed(ConversionError::Internal(
                        "conversion worker panicked".into(),
                    ))
                }
            };

            match outcome {
                ConversionOutcome::Succeeded => result.succeeded += 1,
                ConversionOutcome::Failed(error) => {
                    tracing::warn!("Failed to convert {:?}: {error}", job.source_path());
                    result.failures.push(JobFailure {
                        job: job.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            "Batch finished: {}/{} succeeded",
            result.succeeded,
            result.total
        );

        Ok(result)
    }
}

fn check_format(kind: MediaKind, format: OutputFormat) -> Result<(), ConfigurationError> {
    if kind.supports(format) {
        Ok(())
    } else {
        Err(ConfigurationError::FormatKindMismatch { format, kind })
    }
}
