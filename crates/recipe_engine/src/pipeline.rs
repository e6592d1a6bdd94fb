use std::sync::Arc;

use chrono::Utc;
use crawl_logging::{crawl_info, crawl_warn};
use recipe_core::{CrawlTarget, PageKind, ParserVersion, ProcessingStatus, TargetId};
use tokio_util::sync::CancellationToken;

use crate::error::{render_error_chain, ProcessError};
use crate::extract::Extractor;
use crate::fetch::{FetchedPage, PageFetcher};
use crate::normalize::{NormalizerRegistry, SitePage};
use crate::processor::{ProcessOutcome, WrapperProcessor};
use crate::schema::group_objects;
use crate::store::{CrawlStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// `NotStarted -> Downloading -> Download* -> Finished*`
    Scheduled,
    /// `NotStarted -> Started -> Finished*`
    Immediate,
}

/// Result of one pass over a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub target_id: TargetId,
    pub status: ProcessingStatus,
    pub page_kind: PageKind,
    /// The page could not be downloaded; the host deserves a longer pause.
    pub fetch_failed: bool,
    /// Cancellation interrupted the fetch and the target was released.
    pub cancelled: bool,
}

impl TargetReport {
    fn from_target(target: &CrawlTarget, fetch_failed: bool, cancelled: bool) -> Self {
        Self {
            target_id: target.id,
            status: target.status,
            page_kind: target.page_kind,
            fetch_failed,
            cancelled,
        }
    }
}

/// Fetch, extract, group, normalize and process a single target.
pub struct TargetPipeline {
    store: Arc<dyn CrawlStore>,
    fetcher: PageFetcher,
    extractor: Arc<dyn Extractor>,
    normalizers: NormalizerRegistry,
    processor: WrapperProcessor,
    parser_version: ParserVersion,
}

impl TargetPipeline {
    pub fn new(
        store: Arc<dyn CrawlStore>,
        fetcher: PageFetcher,
        extractor: Arc<dyn Extractor>,
        normalizers: NormalizerRegistry,
        processor: WrapperProcessor,
        parser_version: ParserVersion,
    ) -> Self {
        Self {
            store,
            fetcher,
            extractor,
            normalizers,
            processor,
            parser_version,
        }
    }

    pub fn parser_version(&self) -> ParserVersion {
        self.parser_version
    }

    /// Scheduler entry point. Only store failures are returned as errors;
    /// everything about the page itself ends up on the target.
    pub async fn process_scheduled(
        &self,
        target: CrawlTarget,
        cancel: &CancellationToken,
    ) -> Result<TargetReport, StoreError> {
        self.run(target, Mode::Scheduled, Some(cancel)).await
    }

    /// On-demand reprocessing of a single target, bypassing the scheduler.
    pub async fn process_now(&self, target_id: TargetId) -> Result<TargetReport, StoreError> {
        let target = self
            .store
            .target(target_id)
            .await?
            .ok_or(StoreError::TargetNotFound(target_id))?;
        self.run(target, Mode::Immediate, None).await
    }

    async fn run(
        &self,
        mut target: CrawlTarget,
        mode: Mode,
        cancel: Option<&CancellationToken>,
    ) -> Result<TargetReport, StoreError> {
        match mode {
            Mode::Scheduled => target.begin_download(Utc::now()),
            Mode::Immediate => target.begin_immediate(Utc::now()),
        }
        // Claim the target before any network work.
        self.store.update_target(&target).await?;

        let cached = target.raw_html.clone();
        let fetch = self.fetcher.fetch_page(&target.url, cached.as_deref());
        let page: FetchedPage = match cancel {
            Some(token) => tokio::select! {
                page = fetch => page,
                _ = token.cancelled() => {
                    crawl_info!("Cancelled while fetching {}", target.url);
                    target.release(Utc::now());
                    self.store.update_target(&target).await?;
                    return Ok(TargetReport::from_target(&target, false, true));
                }
            },
            None => fetch.await,
        };

        let Some(html) = page.html else {
            let message = page
                .error
                .map(|err| err.to_string())
                .unwrap_or_else(|| "fetch returned no document".to_string());
            target.download_failed(message.clone(), Utc::now());
            target.finish_error(message, self.parser_version, Utc::now());
            self.store.update_target(&target).await?;
            return Ok(TargetReport::from_target(&target, true, false));
        };

        target.download_succeeded(html.clone(), Utc::now());
        if !page.from_cache {
            self.store.update_target(&target).await?;
        }

        match self.process_html(&mut target, &html).await {
            Ok(outcome) => {
                target.finish_success(self.parser_version, Utc::now());
                crawl_info!(
                    "Finished {} as {:?} ({} new urls)",
                    target.url,
                    outcome.kind,
                    outcome.enqueued
                );
            }
            Err(ProcessError::Store(err)) => return Err(err),
            Err(err) => {
                let message = render_error_chain(&err);
                crawl_warn!("Processing {} failed: {message}", target.url);
                target.finish_error(message, self.parser_version, Utc::now());
            }
        }
        self.store.update_target(&target).await?;
        Ok(TargetReport::from_target(&target, false, false))
    }

    async fn process_html(
        &self,
        target: &mut CrawlTarget,
        html: &str,
    ) -> Result<ProcessOutcome, ProcessError> {
        let extracted = self.extractor.extract(html);
        target.extracted_json = extracted.json_blocks;
        let objects = group_objects(&target.extracted_json)?;

        let normalizer = self.normalizers.resolve(&target.host);
        let page = normalizer.normalize_site(SitePage {
            url: target.url.clone(),
            cleaned_html: extracted.cleaned_html,
            objects,
        })?;
        self.processor
            .process(target, &page, normalizer.as_ref())
            .await
    }
}
