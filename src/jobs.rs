use crate::error::{AppError, AppResult};
use crate::store::LinkStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Background job types
#[derive(Debug)]
pub enum Job {
    /// Write the link store to its snapshot file
    FlushSnapshot,
}

/// Background worker configuration
#[derive(Clone)]
pub struct WorkerConfig {
    /// Maximum retries for failed jobs
    pub max_retries: u32,
    /// Backoff duration between retries
    pub retry_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Background job worker
pub struct Worker {
    store: Arc<LinkStore>,
    snapshot_path: PathBuf,
    receiver: mpsc::UnboundedReceiver<Job>,
    config: WorkerConfig,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        store: Arc<LinkStore>,
        snapshot_path: PathBuf,
        receiver: mpsc::UnboundedReceiver<Job>,
    ) -> Self {
        Self {
            store,
            snapshot_path,
            receiver,
            config: WorkerConfig::default(),
        }
    }

    /// Set worker configuration
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the worker - processes jobs until channel closes
    pub async fn run(mut self) {
        info!("Background worker started");

        while let Some(job) = self.receiver.recv().await {
            self.process_job(job).await;
        }

        info!("Background worker stopped");
    }

    /// Process a single job with retries
    async fn process_job(&self, job: Job) {
        let mut retries = 0;

        loop {
            match self.execute_job(&job).await {
                Ok(_) => break,
                Err(e) if retries < self.config.max_retries => {
                    retries += 1;
                    let delay = Duration::from_millis(self.config.retry_delay_ms);
                    warn!(
                        "Job failed (attempt {}/{}), retrying in {:?}: {:?}: {}",
                        retries, self.config.max_retries, delay, job, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        "Job failed after {} retries: {:?}: {}",
                        self.config.max_retries, job, e
                    );
                    break;
                }
            }
        }
    }

    /// Execute a job without retries
    async fn execute_job(&self, job: &Job) -> AppResult<()> {
        match job {
            Job::FlushSnapshot => {
                let store = Arc::clone(&self.store);
                let path = self.snapshot_path.clone();
                let written = tokio::task::spawn_blocking(move || store.save_snapshot(&path))
                    .await
                    .map_err(|e| AppError::Internal(format!("Flush task failed: {}", e)))??;
                debug!("Snapshot flushed ({} links)", written);
                Ok(())
            }
        }
    }
}

/// Job sender - used to submit jobs to the worker
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::UnboundedSender<Job>,
}

impl JobSender {
    /// Create a new job sender
    pub fn new(sender: mpsc::UnboundedSender<Job>) -> Self {
        Self { sender }
    }

    /// Submit a job to be processed asynchronously
    pub fn send(&self, job: Job) {
        if self.sender.send(job).is_err() {
            error!("Failed to send job to worker - channel may be closed");
        }
    }

    /// Submit a snapshot flush job
    pub fn flush_snapshot(&self) {
        self.send(Job::FlushSnapshot);
    }
}

/// Create a new job sender and receiver pair
pub fn create_job_channel() -> (JobSender, mpsc::UnboundedReceiver<Job>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (JobSender::new(sender), receiver)
}

/// Spawn a task that requests a snapshot flush every `interval`.
pub fn spawn_flush_ticker(sender: JobSender, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sender.flush_snapshot();
        }
    })
}
