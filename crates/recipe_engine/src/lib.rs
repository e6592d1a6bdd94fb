//! Recipe engine: fetching, structured-data extraction, per-site
//! normalization, entity processing and the per-host crawl scheduler.
mod decode;
mod enqueue;
mod error;
mod extract;
mod fetch;
mod normalize;
mod persist;
mod pipeline;
mod processor;
mod rerun;
mod scheduler;
pub mod schema;
mod store;
mod types;

pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use enqueue::{enqueue_url, normalize_url};
pub use error::{render_error_chain, ProcessError};
pub use extract::{ExtractedPage, Extractor, StructuredDataExtractor, STRUCTURED_DATA_MARKER};
pub use fetch::{FetchSettings, FetchedPage, Fetcher, PageFetcher, ReqwestFetcher};
pub use normalize::{
    absolute_http_url, strip_query, BbcGoodFoodNormalizer, BudgetBytesNormalizer,
    DefaultNormalizer, DotdashNormalizer, NormalizeError, NormalizerRegistry,
    NytCookingNormalizer, SiteNormalizer, SitePage,
};
pub use persist::{ensure_parent_dir, read_if_exists, write_atomically, PersistError};
pub use pipeline::{TargetPipeline, TargetReport};
pub use processor::{fingerprint, ProcessOutcome, WrapperProcessor};
pub use rerun::reset_outdated_targets;
pub use scheduler::{HostScheduler, HostStatusBoard, SchedulerSettings};
pub use schema::{group_objects, PageObjects, SchemaError};
pub use store::{CrawlStore, MemoryStore, StoreError, StoreSnapshot};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
