//! Batch dispatcher: runs many translation jobs concurrently and reports
//! one status line per job.
//!
//! Every job reads its input, calls the endpoint, and writes its output on its
//! own. A failing or panicking job is turned into a `FAILURE` report; it never
//! stops its siblings. Concurrency of remote calls is bounded by the
//! endpoint's gate, not here.

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::core::client::{TranslationClient, TranslationEndpoint};
use crate::core::config::ClientConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::fingerprint::fingerprint;
use crate::core::models::{extension_of, TranslationJob, TranslationResult, TranslationSettings};

/// Output path meaning "write to standard output"
pub const STDOUT_PATH: &str = "-";

/// Input path meaning "read from standard input"
pub const STDIN_PATH: &str = "-";

/// Input file and the path its translation is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    /// File to translate, or `-` for standard input
    pub input: PathBuf,
    /// Destination, or `-` for standard output
    pub output: PathBuf,
    /// Extension sent to the service instead of the one derived from `input`
    pub extension: Option<String>,
}

impl PathPair {
    /// Create a new pair
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            extension: None,
        }
    }

    /// Override the document extension, needed when reading standard input
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into().trim_start_matches('.').to_lowercase());
        self
    }

    fn job_extension(&self) -> String {
        self.extension
            .clone()
            .unwrap_or_else(|| extension_of(&self.input))
    }
}

/// Why a job did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The endpoint reported [`TranslationResult::Failed`]
    Translation,
    /// Input could not be read or output could not be written
    Io(String),
    /// The job panicked
    Unexpected(String),
}

/// Terminal state of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Translation written to the output path
    Success,
    /// No output was written
    Failure(FailureReason),
}

/// Per-job result, rendered as a status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// Input path as given
    pub input: PathBuf,
    /// Output path as given
    pub output: PathBuf,
    /// Content fingerprint; `None` when the input could not be read
    pub fingerprint: Option<String>,
    /// Terminal state
    pub status: JobStatus,
}

impl JobReport {
    /// Check if the job succeeded
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.is_success() { "SUCCESS" } else { "FAILURE" };
        write!(
            f,
            "{}\t{}\t{}",
            label,
            self.input.display(),
            self.fingerprint.as_deref().unwrap_or("-")
        )
    }
}

/// Tally of a finished batch
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Jobs finished
    pub total: usize,
    /// Jobs whose output was written
    pub succeeded: usize,
    /// Reports in completion order
    pub reports: Vec<JobReport>,
}

impl BatchOutcome {
    /// Number of jobs that did not succeed
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// Check if every job succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Final summary line
    pub fn summary(&self) -> String {
        format!(
            "Processed {} files: {} successes, {} failures.",
            self.total,
            self.succeeded,
            self.failed()
        )
    }

    fn record(&mut self, report: JobReport) {
        self.total += 1;
        if report.is_success() {
            self.succeeded += 1;
        }
        self.reports.push(report);
    }
}

/// Callback receiving each report as soon as its job finishes
pub type StatusSink = Arc<dyn Fn(&JobReport) + Send + Sync>;

type InputReader = Box<dyn AsyncRead + Send + Unpin>;

/// Runs translation jobs against an endpoint
pub struct BatchDispatcher<E> {
    endpoint: E,
    settings: TranslationSettings,
    sink: StatusSink,
    stdin: Mutex<Option<InputReader>>,
}

impl<E: TranslationEndpoint> BatchDispatcher<E> {
    /// Create a dispatcher writing status lines to stderr
    pub fn new(endpoint: E, settings: TranslationSettings) -> Self {
        Self {
            endpoint,
            settings,
            sink: Arc::new(|report: &JobReport| eprintln!("{}", report)),
            stdin: Mutex::new(None),
        }
    }

    /// Read `-` inputs from `reader` instead of the process's standard input
    pub fn with_stdin(self, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            stdin: Mutex::new(Some(Box::new(reader))),
            ..self
        }
    }

    /// Replace the status line destination
    pub fn with_status_sink(mut self, sink: impl Fn(&JobReport) + Send + Sync + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Endpoint used by this dispatcher
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Run every pair to a terminal outcome and tally the results
    pub async fn run(&self, pairs: Vec<PathPair>) -> BatchOutcome {
        let start_time = Instant::now();
        info!("Dispatching {} jobs", pairs.len());

        let mut pending: FuturesUnordered<_> =
            pairs.into_iter().map(|pair| self.run_guarded(pair)).collect();

        let mut outcome = BatchOutcome::default();
        while let Some(report) = pending.next().await {
            (self.sink)(&report);
            outcome.record(report);
        }

        info!(
            "Completed: {} succeeded, {} failed in {:?}",
            outcome.succeeded,
            outcome.failed(),
            start_time.elapsed()
        );
        outcome
    }

    async fn run_guarded(&self, pair: PathPair) -> JobReport {
        let content = match self.read_input(&pair.input).await {
            Ok(content) => content,
            Err(e) => {
                let err = TranslationError::file(&pair.input, e);
                error!("{}", err);
                return JobReport {
                    input: pair.input,
                    output: pair.output,
                    fingerprint: None,
                    status: JobStatus::Failure(FailureReason::Io(err.to_string())),
                };
            }
        };

        let digest = fingerprint(&content);
        let job = TranslationJob::new(&self.settings, content, pair.job_extension());

        let status = match AssertUnwindSafe(self.execute(job, &pair.output))
            .catch_unwind()
            .await
        {
            Ok(status) => status,
            Err(panic) => {
                let message = panic_message(&*panic);
                error!("Job for {} panicked: {}", pair.input.display(), message);
                JobStatus::Failure(FailureReason::Unexpected(message))
            }
        };

        JobReport {
            input: pair.input,
            output: pair.output,
            fingerprint: Some(digest),
            status,
        }
    }

    async fn read_input(&self, input: &Path) -> std::io::Result<String> {
        if input != Path::new(STDIN_PATH) {
            return tokio::fs::read_to_string(input).await;
        }

        let mut content = String::new();
        match self.stdin.lock().await.take() {
            Some(mut reader) => reader.read_to_string(&mut content).await?,
            None => tokio::io::stdin().read_to_string(&mut content).await?,
        };
        Ok(content)
    }

    async fn execute(&self, job: TranslationJob, output: &Path) -> JobStatus {
        debug!("Translating {} bytes ({})", job.content.len(), job.extension);

        match self.endpoint.translate(job).await {
            TranslationResult::Translated(content) => match write_output(output, &content).await {
                Ok(()) => JobStatus::Success,
                Err(e) => {
                    error!("{}", e);
                    JobStatus::Failure(FailureReason::Io(e.to_string()))
                }
            },
            TranslationResult::Failed => JobStatus::Failure(FailureReason::Translation),
        }
    }
}

/// Build a client limited to `max_concurrent` in-flight calls and run `pairs`
/// through it
pub async fn run_batch(
    config: ClientConfig,
    settings: TranslationSettings,
    pairs: Vec<PathPair>,
    max_concurrent: usize,
) -> Result<BatchOutcome> {
    let client = TranslationClient::new(config.with_max_concurrent(max_concurrent))?;
    Ok(BatchDispatcher::new(client, settings).run(pairs).await)
}

/// Write translated content, creating parent directories as needed
async fn write_output(output: &Path, content: &str) -> Result<()> {
    if output == Path::new(STDOUT_PATH) {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(content.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TranslationError::file(parent, e))?;
        }
    }

    tokio::fs::write(output, content)
        .await
        .map_err(|e| TranslationError::file(output, e))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
