use chrono::Utc;
use crawl_logging::crawl_debug;
use recipe_core::{CrawlTarget, TargetId};
use url::Url;

use crate::store::{CrawlStore, StoreError};

/// Turns a discovered link into an absolute http(s) URL without fragment.
/// Protocol-relative and path-relative links are resolved against `base`.
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(raw).ok()?,
        Err(_) => return None,
    };
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    let mut url = parsed;
    url.set_fragment(None);
    Some(url)
}

/// Adds a pending target for `raw` unless one already exists for the exact
/// normalized URL. Returns the new id when a target was created.
pub async fn enqueue_url(
    store: &dyn CrawlStore,
    raw: &str,
    base: Option<&Url>,
) -> Result<Option<TargetId>, StoreError> {
    let Some(url) = normalize_url(raw, base) else {
        crawl_debug!("Ignoring unusable link {raw:?}");
        return Ok(None);
    };
    let Ok(target) = CrawlTarget::new(&url, Utc::now()) else {
        return Ok(None);
    };
    let inserted = store.insert_target_if_absent(target).await?;
    if let Some(id) = inserted {
        crawl_debug!("Enqueued {url} as target {id}");
    }
    Ok(inserted)
}
