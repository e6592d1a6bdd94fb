//! Per-site adapters that patch structured data the publisher left
//! incomplete and canonicalize CDN image URLs.
use std::collections::HashMap;
use std::sync::Arc;

use crate::schema::PageObjects;

mod html;
mod sites;

pub use html::{absolute_http_url, strip_query};
pub use sites::{BbcGoodFoodNormalizer, BudgetBytesNormalizer, DotdashNormalizer, NytCookingNormalizer};

/// A page on its way from the grouper to the processor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SitePage {
    pub url: String,
    pub cleaned_html: String,
    pub objects: PageObjects,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("page url {url} is not absolute")]
    PageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("author reference {reference} does not match any Person on the page")]
    UnresolvedAuthor { reference: String },
}

pub trait SiteNormalizer: Send + Sync {
    /// Host name this normalizer is registered under.
    fn host(&self) -> &str;

    /// Extra links worth crawling that the structured data does not list.
    fn urls_to_queue(&self, _page: &SitePage) -> Vec<String> {
        Vec::new()
    }

    /// Canonical form of an image URL, or `None` when it is unusable.
    fn normalize_image_url(&self, raw: &str) -> Option<String> {
        absolute_http_url(raw)
    }

    fn normalize_site(&self, page: SitePage) -> Result<SitePage, NormalizeError> {
        Ok(page)
    }
}

/// Identity normalizer used for every host without a dedicated adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNormalizer;

impl SiteNormalizer for DefaultNormalizer {
    fn host(&self) -> &str {
        "*"
    }
}

/// Host name to normalizer lookup with an identity fallback.
#[derive(Clone)]
pub struct NormalizerRegistry {
    by_host: HashMap<String, Arc<dyn SiteNormalizer>>,
    fallback: Arc<dyn SiteNormalizer>,
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl NormalizerRegistry {
    pub fn empty() -> Self {
        Self {
            by_host: HashMap::new(),
            fallback: Arc::new(DefaultNormalizer),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(DotdashNormalizer::new("www.allrecipes.com")));
        registry.register(Arc::new(DotdashNormalizer::new("www.seriouseats.com")));
        registry.register(Arc::new(NytCookingNormalizer));
        registry.register(Arc::new(BudgetBytesNormalizer));
        registry.register(Arc::new(BbcGoodFoodNormalizer));
        registry
    }

    pub fn register(&mut self, normalizer: Arc<dyn SiteNormalizer>) {
        self.by_host
            .insert(normalizer.host().to_ascii_lowercase(), normalizer);
    }

    /// Exact host match; anything else gets the identity normalizer.
    pub fn resolve(&self, host: &str) -> Arc<dyn SiteNormalizer> {
        self.by_host
            .get(&host.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.by_host.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}
