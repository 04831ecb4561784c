//! Runs the agent's worker task with graceful shutdown.
//!
//! The starting context hands the worker to the runner and joins: the runner
//! spawns the worker, cancels it on SIGTERM/SIGINT (or when the worker fails),
//! executes cleanup closers under a timeout, and exits the process.
//!
//! # Example
//!
//! ```no_run
//! use coldtrack_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new()
//!         .with_worker(|ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => {
//!                         tracing::info!("worker stopping gracefully");
//!                         break;
//!                     }
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("worker cycle");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("cleaning up");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5));
//!
//!     runner.run().await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// The worker function: takes the cancellation token, returns the worker's
/// terminal result.
pub type Worker = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>
        + Send,
>;

/// A cleanup function executed after the worker has stopped.
pub type Closer = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>> + Send>;

pub struct Runner {
    worker: Option<Worker>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            worker: None,
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Sets the worker task. The runner joins on it; its error is the
    /// process's error.
    pub fn with_worker<F, Fut>(mut self, worker: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.worker = Some(Box::new(|token| Box::pin(worker(token))));
        self
    }

    /// Adds a closer, executed after the worker has stopped regardless of how
    /// it stopped. All closers attempt to run even if some fail.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Allows external control over cancellation, mainly for tests.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Starts the worker, waits for it to finish or for a shutdown signal,
    /// runs the closers, and exits the process.
    pub async fn run(self) {
        let token = self.cancellation_token;
        let closers = self.closers;
        let closer_timeout = self.closer_timeout;

        let worker_handle = self.worker.map(|worker| {
            let worker_token = token.clone();
            tokio::spawn(async move { worker(worker_token).await })
        });

        let signal_token = token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("received shutdown signal");
                    signal_token.cancel();
                }
                Err(err) => {
                    tracing::error!("error setting up signal handler: {}", err);
                }
            }
        });

        #[cfg(unix)]
        {
            let sigterm_token = token.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                        tracing::info!("received SIGTERM signal");
                        sigterm_token.cancel();
                    }
                    Err(err) => {
                        tracing::error!("error setting up SIGTERM handler: {}", err);
                    }
                }
            });
        }

        let mut worker_error = None;
        if let Some(handle) = worker_handle {
            match handle.await {
                Ok(Ok(())) => {
                    tracing::debug!("worker completed");
                }
                Ok(Err(err)) => {
                    tracing::error!("worker error: {:#}", err);
                    worker_error = Some(err);
                }
                Err(err) => {
                    tracing::error!("worker panicked: {}", err);
                    worker_error = Some(anyhow::anyhow!("worker panicked: {err}"));
                }
            }
        }
        token.cancel();

        if !closers.is_empty() {
            tracing::info!("running closers with timeout of {:?}", closer_timeout);
            match tokio::time::timeout(closer_timeout, run_closers(closers)).await {
                Ok(_) => tracing::info!("all closers completed"),
                Err(_) => tracing::error!("closers timed out after {:?}", closer_timeout),
            }
        }

        if let Some(err) = worker_error {
            tracing::error!("exiting with error: {:#}", err);
            std::process::exit(1);
        } else {
            tracing::info!("exiting normally");
            std::process::exit(0);
        }
    }
}

/// Runs all closers concurrently.
async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();

    for closer in closers {
        closer_set.spawn(async move { closer().await });
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => tracing::debug!("closer completed"),
            Ok(Err(err)) => tracing::error!("closer error: {:#}", err),
            Err(err) => tracing::error!("closer panicked: {}", err),
        }
    }
}
