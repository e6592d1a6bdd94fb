use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

pub type TargetId = u64;

/// Monotonic parser version; a target is reprocessed only when the running
/// parser is newer than the version that last processed it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ParserVersion(pub u32);

impl ParserVersion {
    /// Stored version `0` means "never processed" and is not eligible for a re-run.
    pub fn is_outdated(self, latest: ParserVersion) -> bool {
        self.0 > 0 && self < latest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStatus {
    NotStarted,
    /// Immediate (non-batch) processing has claimed the target.
    Started,
    Downloading,
    DownloadSucceeded,
    DownloadFailed,
    FinishedSuccess,
    FinishedError,
}

impl ProcessingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProcessingStatus::FinishedSuccess | ProcessingStatus::FinishedError
        )
    }

    /// Statuses the scheduler treats as work to pick up. `Downloading` is
    /// included so that targets interrupted by a crash are resumed.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            ProcessingStatus::NotStarted | ProcessingStatus::Downloading
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PageKind {
    #[default]
    Unclassified,
    Recipe,
    Author,
    Breadcrumb,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub id: TargetId,
    pub url: String,
    pub host: String,
    pub status: ProcessingStatus,
    pub parser_version: ParserVersion,
    pub page_kind: PageKind,
    pub raw_html: Option<String>,
    pub extracted_json: Vec<String>,
    pub fingerprint: Option<String>,
    pub error: Option<String>,
    pub same_as: Option<TargetId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetUrlError {
    #[error("invalid url {0}")]
    Invalid(String),
    #[error("url has no host: {0}")]
    MissingHost(String),
}

impl CrawlTarget {
    /// Creates a pending target. The id is a placeholder until a store assigns one.
    pub fn new(url: &Url, now: DateTime<Utc>) -> Result<Self, TargetUrlError> {
        let host = url
            .host_str()
            .ok_or_else(|| TargetUrlError::MissingHost(url.to_string()))?
            .to_ascii_lowercase();
        Ok(Self {
            id: 0,
            url: url.to_string(),
            host,
            status: ProcessingStatus::NotStarted,
            parser_version: ParserVersion::default(),
            page_kind: PageKind::Unclassified,
            raw_html: None,
            extracted_json: Vec::new(),
            fingerprint: None,
            error: None,
            same_as: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        })
    }

    pub fn parse(raw: &str, now: DateTime<Utc>) -> Result<Self, TargetUrlError> {
        let url = Url::parse(raw).map_err(|_| TargetUrlError::Invalid(raw.to_string()))?;
        Self::new(&url, now)
    }

    pub fn begin_download(&mut self, now: DateTime<Utc>) {
        self.status = ProcessingStatus::Downloading;
        self.started_at = Some(now);
        self.completed_at = None;
        self.error = None;
        self.updated_at = now;
    }

    pub fn begin_immediate(&mut self, now: DateTime<Utc>) {
        self.status = ProcessingStatus::Started;
        self.started_at = Some(now);
        self.completed_at = None;
        self.error = None;
        self.updated_at = now;
    }

    pub fn download_succeeded(&mut self, html: String, now: DateTime<Utc>) {
        self.raw_html = Some(html);
        if self.status == ProcessingStatus::Downloading {
            self.status = ProcessingStatus::DownloadSucceeded;
        }
        self.updated_at = now;
    }

    pub fn download_failed(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        if self.status == ProcessingStatus::Downloading {
            self.status = ProcessingStatus::DownloadFailed;
        }
        self.error = Some(message.into());
        self.updated_at = now;
    }

    /// Terminal success. The parser version only ever moves forward.
    pub fn finish_success(&mut self, version: ParserVersion, now: DateTime<Utc>) {
        self.status = ProcessingStatus::FinishedSuccess;
        self.error = None;
        self.finish(version, now);
    }

    pub fn finish_error(
        &mut self,
        message: impl Into<String>,
        version: ParserVersion,
        now: DateTime<Utc>,
    ) {
        self.status = ProcessingStatus::FinishedError;
        self.error = Some(message.into());
        self.finish(version, now);
    }

    fn finish(&mut self, version: ParserVersion, now: DateTime<Utc>) {
        self.parser_version = self.parser_version.max(version);
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Puts an in-flight target back in the queue, e.g. when a worker is
    /// cancelled mid-fetch.
    pub fn release(&mut self, now: DateTime<Utc>) {
        self.status = ProcessingStatus::NotStarted;
        self.started_at = None;
        self.updated_at = now;
    }

    /// Re-run gate: only terminal targets processed by an older, non-zero
    /// parser version are reset. Returns whether the target changed.
    pub fn reset_for_reprocessing(&mut self, latest: ParserVersion, now: DateTime<Utc>) -> bool {
        if !self.status.is_terminal() || !self.parser_version.is_outdated(latest) {
            return false;
        }
        self.status = ProcessingStatus::NotStarted;
        self.error = None;
        self.started_at = None;
        self.completed_at = None;
        self.updated_at = now;
        true
    }

    pub fn mark_same_as(&mut self, other: TargetId) {
        self.page_kind = PageKind::Duplicate;
        self.same_as = Some(other);
    }
}
