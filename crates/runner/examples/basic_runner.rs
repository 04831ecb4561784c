//! Basic example of using the coldtrack runner
//!
//! This example demonstrates:
//! - Running a worker loop under the runner
//! - Graceful shutdown on SIGTERM/SIGINT (Ctrl+C)
//! - Cleanup with closers
//!
//! Run with: cargo run --example basic_runner

use coldtrack_runner::Runner;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("starting runner example");

    let runner = Runner::new()
        // Worker: counts a cycle every second until shutdown.
        .with_worker(|ctx| async move {
            let mut cycle = 0u64;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!("worker stopping gracefully at cycle: {}", cycle);
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        cycle += 1;
                        tracing::info!("cycle: {}", cycle);
                    }
                }
            }
            Ok(())
        })
        .with_closer(|| async move {
            tracing::info!("closer: flushing buffers...");
            tokio::time::sleep(Duration::from_millis(300)).await;
            tracing::info!("closer: done");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(5));

    tracing::info!("press Ctrl+C to trigger graceful shutdown");
    runner.run().await;
}
