use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crawl_logging::{crawl_error, crawl_info, crawl_warn};
use recipe_core::{IngredientNameCache, TargetId};
use recipe_engine::{
    enqueue_url, reset_outdated_targets, CrawlStore, HostScheduler, MemoryStore,
    NormalizerRegistry, PageFetcher, ReqwestFetcher, StructuredDataExtractor, TargetPipeline,
    WrapperProcessor,
};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// Everything the binary wires together around one in-memory store.
pub(crate) struct Crawler {
    store: Arc<MemoryStore>,
    snapshot_path: PathBuf,
    snapshot_interval: Option<Duration>,
    pipeline: Arc<TargetPipeline>,
    scheduler: Arc<HostScheduler>,
}

impl Crawler {
    /// Loads the snapshot, enqueues seeds, warms the ingredient cache and
    /// resets targets processed by an older parser.
    pub(crate) async fn start(config: &AppConfig, extra_seeds: &[String]) -> Result<Self> {
        let store = Arc::new(
            MemoryStore::load(&config.snapshot_path).with_context(|| {
                format!("loading snapshot {}", config.snapshot_path.display())
            })?,
        );

        let mut enqueued = 0;
        for url in config.seed_urls.iter().chain(extra_seeds) {
            if enqueue_url(store.as_ref(), url, None).await?.is_some() {
                enqueued += 1;
            }
        }
        crawl_info!("Enqueued {enqueued} new seed URLs");

        let names = Arc::new(IngredientNameCache::new());
        let known = names.refresh(store.ingredient_names().await?);
        crawl_info!("Ingredient cache holds {known} names");

        let parser_version = config.parser_version();
        reset_outdated_targets(store.as_ref(), parser_version).await?;

        let fetcher = PageFetcher::new(Arc::new(ReqwestFetcher::new(config.fetch_settings())));
        let pipeline = Arc::new(TargetPipeline::new(
            store.clone(),
            fetcher,
            Arc::new(StructuredDataExtractor),
            NormalizerRegistry::with_defaults(),
            WrapperProcessor::new(store.clone(), names),
            parser_version,
        ));
        let scheduler = Arc::new(HostScheduler::new(
            store.clone(),
            pipeline.clone(),
            config.scheduler_settings(),
        ));

        Ok(Self {
            store,
            snapshot_path: config.snapshot_path.clone(),
            snapshot_interval: config.snapshot_interval(),
            pipeline,
            scheduler,
        })
    }

    pub(crate) async fn process_one(self, target_id: TargetId) -> Result<()> {
        let report = self
            .pipeline
            .process_now(target_id)
            .await
            .with_context(|| format!("processing target {target_id}"))?;
        crawl_info!(
            "Target {} finished as {:?} ({:?})",
            report.target_id,
            report.status,
            report.page_kind
        );
        self.save_snapshot().await
    }

    /// Runs the scheduler until Ctrl-C, saving the snapshot periodically and
    /// once more after every worker has stopped.
    pub(crate) async fn crawl_until_interrupted(self) -> Result<()> {
        let cancel = CancellationToken::new();
        let runner = {
            let scheduler = self.scheduler.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { scheduler.run(cancel).await })
        };
        let saver = self.snapshot_interval.map(|interval| {
            tokio::spawn(save_periodically(
                self.store.clone(),
                self.snapshot_path.clone(),
                interval,
                cancel.clone(),
            ))
        });

        match tokio::signal::ctrl_c().await {
            Ok(()) => crawl_info!("Interrupt received, stopping workers"),
            Err(err) => crawl_error!("Cannot listen for Ctrl-C, stopping: {err}"),
        }
        cancel.cancel();

        if let Err(err) = runner.await {
            crawl_error!("Scheduler task failed: {err}");
        }
        if let Some(saver) = saver {
            if let Err(err) = saver.await {
                crawl_error!("Snapshot task failed: {err}");
            }
        }
        self.save_snapshot().await
    }

    async fn save_snapshot(&self) -> Result<()> {
        self.store
            .save(&self.snapshot_path)
            .await
            .with_context(|| format!("saving snapshot {}", self.snapshot_path.display()))?;
        crawl_info!("Snapshot saved to {}", self.snapshot_path.display());
        Ok(())
    }
}

async fn save_periodically(
    store: Arc<MemoryStore>,
    path: PathBuf,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
        if let Err(err) = store.save(&path).await {
            crawl_warn!("Periodic snapshot to {} failed: {err}", path.display());
        }
    }
}
