use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crawl_logging::{crawl_debug, crawl_error, crawl_info};
use dashmap::DashMap;
use recipe_core::HostWorkerStatus;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::pipeline::TargetPipeline;
use crate::store::CrawlStore;

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// How often the supervisor looks for hosts with pending work.
    pub discovery_interval: Duration,
    /// Pause of a worker whose host has nothing pending.
    pub idle_poll_delay: Duration,
    /// Politeness delay after a successful fetch is drawn from this range.
    pub success_delay_min: Duration,
    pub success_delay_max: Duration,
    /// Politeness delay after a failed fetch.
    pub failure_delay: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            discovery_interval: Duration::from_secs(30),
            idle_poll_delay: Duration::from_secs(10),
            success_delay_min: Duration::from_secs(2),
            success_delay_max: Duration::from_secs(6),
            failure_delay: Duration::from_secs(5 * 60),
        }
    }
}

impl SchedulerSettings {
    pub fn delay_after(&self, fetch_failed: bool) -> Duration {
        if fetch_failed {
            return self.failure_delay;
        }
        let min = self.success_delay_min.as_millis() as u64;
        let max = (self.success_delay_max.as_millis() as u64).max(min);
        Duration::from_millis(fastrand::u64(min..=max))
    }
}

/// Read-only view of the live per-host worker state.
#[derive(Debug, Clone, Default)]
pub struct HostStatusBoard {
    entries: Arc<DashMap<String, HostWorkerStatus>>,
}

impl HostStatusBoard {
    pub fn snapshot(&self) -> BTreeMap<String, HostWorkerStatus> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn get(&self, host: &str) -> Option<HostWorkerStatus> {
        self.entries.get(host).map(|entry| entry.value().clone())
    }

    fn set(&self, host: &str, status: HostWorkerStatus) {
        self.entries.insert(host.to_string(), status);
    }
}

/// Supervisor that keeps exactly one worker per host with pending targets.
pub struct HostScheduler {
    store: Arc<dyn CrawlStore>,
    pipeline: Arc<TargetPipeline>,
    settings: SchedulerSettings,
    board: HostStatusBoard,
}

impl HostScheduler {
    pub fn new(
        store: Arc<dyn CrawlStore>,
        pipeline: Arc<TargetPipeline>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            store,
            pipeline,
            settings,
            board: HostStatusBoard::default(),
        }
    }

    pub fn status_board(&self) -> HostStatusBoard {
        self.board.clone()
    }

    pub fn status_snapshot(&self) -> BTreeMap<String, HostWorkerStatus> {
        self.board.snapshot()
    }

    /// Runs the discovery loop until `cancel` fires, then waits for every
    /// worker to leave its target in a resumable state.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut workers: HashMap<String, JoinHandle<()>> = HashMap::new();
        crawl_info!("Scheduler started");
        while !cancel.is_cancelled() {
            match self.store.pending_hosts().await {
                Ok(hosts) => {
                    for host in hosts {
                        let alive = workers.get(&host).is_some_and(|handle| !handle.is_finished());
                        if !alive {
                            let handle = self.spawn_worker(host.clone(), cancel.clone());
                            workers.insert(host, handle);
                        }
                    }
                }
                Err(err) => crawl_error!("Host discovery failed: {err}"),
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.discovery_interval) => {}
            }
        }

        for (host, handle) in workers {
            if let Err(err) = handle.await {
                crawl_error!("Worker for {host} panicked: {err}");
            }
        }
        crawl_info!("Scheduler stopped");
    }

    fn spawn_worker(&self, host: String, cancel: CancellationToken) -> JoinHandle<()> {
        crawl_info!("Spawning worker for {host}");
        let worker = HostWorker {
            host,
            store: self.store.clone(),
            pipeline: self.pipeline.clone(),
            settings: self.settings.clone(),
            board: self.board.clone(),
        };
        tokio::spawn(worker.run(cancel))
    }
}

struct HostWorker {
    host: String,
    store: Arc<dyn CrawlStore>,
    pipeline: Arc<TargetPipeline>,
    settings: SchedulerSettings,
    board: HostStatusBoard,
}

impl HostWorker {
    /// One target at a time, then a politeness pause. Returns on cancellation
    /// or on the first store failure.
    async fn run(self, cancel: CancellationToken) {
        let host = self.host.as_str();
        self.board.set(host, HostWorkerStatus::default());
        while !cancel.is_cancelled() {
            let next = match self.store.next_pending_for_host(host).await {
                Ok(next) => next,
                Err(err) => {
                    crawl_error!("Worker for {host} stopping: {err}");
                    break;
                }
            };

            let delay = match next {
                None => self.settings.idle_poll_delay,
                Some(target) => {
                    self.board.set(host, HostWorkerStatus::working_on(&target.url));
                    match self.pipeline.process_scheduled(target, &cancel).await {
                        Ok(report) if report.cancelled => break,
                        Ok(report) => self.settings.delay_after(report.fetch_failed),
                        Err(err) => {
                            crawl_error!("Worker for {host} stopping: {err}");
                            break;
                        }
                    }
                }
            };

            let until = Utc::now()
                + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
            self.board.set(host, HostWorkerStatus::waiting(until));
            crawl_debug!("Worker for {host} sleeping {delay:?}");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        self.board.set(host, HostWorkerStatus::default());
    }
}
