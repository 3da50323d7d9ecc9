//! Epoch orchestration
//!
//! Each epoch runs the worker pool for a wall-clock budget, then:
//! - raises the stop signal and waits out the grace period,
//! - aborts any worker that has not exited,
//! - optionally writes a snapshot,
//! - saves the live state.

use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::engine::CrawlEngine;
use super::crawl_types::{CrawlError, CrawlResult, EpochPhase, RunOptions};
use super::metrics::CrawlStats;
use super::page_processor::worker_loop;
use crate::utils::snapshot_name;

impl CrawlEngine {
    /// Run `options.epoch_count` epochs and return the cumulative stats
    ///
    /// Returns early, after finishing the current epoch's drain, snapshot and
    /// save, once `request_stop` has been called. The request is sticky: later
    /// calls return without running an epoch.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Other` if the engine is already running, and
    /// snapshot or save errors from the end of an epoch.
    pub async fn run(&self, options: RunOptions) -> CrawlResult<CrawlStats> {
        if self.phase() != EpochPhase::Idle {
            return Err(CrawlError::Other(format!(
                "engine is already {}",
                self.phase()
            )));
        }
        info!(
            target: "snapcrawl::engine",
            "Starting crawl: {} epochs of {}s from epoch {} ({} workers, {} queued)",
            options.epoch_count,
            options.secs_per_epoch,
            options.start_epoch,
            self.config.max_workers(),
            self.frontier.len()
        );

        let last = options.start_epoch + options.epoch_count;
        for epoch in options.start_epoch..last {
            if self.halt.is_raised() {
                info!(target: "snapcrawl::engine", "Stop requested; not starting epoch {epoch}");
                break;
            }
            let result = self.run_epoch(epoch, &options).await;
            self.set_phase(EpochPhase::Idle);
            result?;
        }

        let stats = self.stats();
        info!(target: "snapcrawl::engine", "Crawl finished: {stats:?}");
        Ok(stats)
    }

    async fn run_epoch(&self, epoch: usize, options: &RunOptions) -> CrawlResult<()> {
        self.epoch_stop.reset();
        self.set_phase(EpochPhase::Running);
        self.progress.report_epoch_started(epoch);
        info!(target: "snapcrawl::engine", "Epoch {epoch} started");

        let ctx = Arc::new(self.worker_context());
        let handles: Vec<(String, JoinHandle<()>)> = (0..self.config.max_workers())
            .map(|i| {
                let name = format!("worker-{i}");
                let handle = tokio::spawn(worker_loop(Arc::clone(&ctx), name.clone()));
                (name, handle)
            })
            .collect();
        drop(ctx);

        self.wait_for_budget(Duration::from_secs(options.secs_per_epoch)).await;

        self.set_phase(EpochPhase::Draining);
        self.epoch_stop.raise();
        info!(target: "snapcrawl::engine", "Epoch {epoch}: stop signal raised");
        self.drain(handles).await;

        if options.make_snapshot {
            self.set_phase(EpochPhase::Snapshotting);
            let name = snapshot_name();
            let handle = self.persist_handle();
            let task_name = name.clone();
            tokio::task::spawn_blocking(move || handle.snapshot(&task_name)).await??;
            self.progress.report_snapshot(&name);
        }

        let handle = self.persist_handle();
        tokio::task::spawn_blocking(move || handle.save()).await??;
        info!(
            target: "snapcrawl::engine",
            "Epoch {epoch} finished: {} files stored, {} bits set in the seen sketch",
            self.file_count(),
            self.met_urls.ones()
        );
        Ok(())
    }

    /// Sleep through the epoch budget, logging a tick now and then
    async fn wait_for_budget(&self, budget: Duration) {
        let started = Instant::now();
        let deadline = started + budget;
        let tick = self.config.tick_interval();

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let step = tick.min(deadline - now);
            tokio::select! {
                () = tokio::time::sleep(step) => {}
                () = self.halt.wait() => {
                    info!(target: "snapcrawl::engine", "Stop requested; cutting the epoch short");
                    break;
                }
            }
            info!(
                target: "snapcrawl::engine",
                "{}s elapsed, frontier length {} ({:.0}% full)",
                started.elapsed().as_secs(),
                self.frontier.len(),
                self.frontier.fill_ratio() * 100.0
            );
        }
    }

    /// Join workers until the grace period runs out; abort the rest
    async fn drain(&self, handles: Vec<(String, JoinHandle<()>)>) {
        let deadline = Instant::now() + self.config.grace_period();
        let mut leaked = 0usize;

        for (name, mut handle) in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(target: "snapcrawl::engine", "{name} failed: {e}"),
                Err(_) => {
                    warn!(
                        target: "snapcrawl::engine",
                        "{name} still running after the grace period; aborting it"
                    );
                    handle.abort();
                    leaked += 1;
                }
            }
        }

        if leaked > 0 {
            warn!(target: "snapcrawl::engine", "{leaked} workers leaked this epoch");
        } else {
            info!(target: "snapcrawl::engine", "All workers stopped");
        }
    }
}
