use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::html::{first_attr, first_text, links, page_url, resolve_author_references};
use super::{absolute_http_url, strip_query, NormalizeError, SiteNormalizer, SitePage};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid normalizer selector")
}

static OG_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:image"]"#));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));

/// Patches an empty recipe description with scraped text.
fn backfill_description(page: &mut SitePage, scrape: impl Fn(&Html) -> Option<String>) {
    if page.objects.recipes().all(|recipe| recipe.description.is_some()) {
        return;
    }
    let document = Html::parse_document(&page.cleaned_html);
    let Some(description) = scrape(&document) else {
        return;
    };
    for recipe in page.objects.recipes_mut() {
        if recipe.description.is_none() {
            recipe.description = Some(description.clone());
        }
    }
}

fn backfill_image(page: &mut SitePage, scrape: impl Fn(&Html) -> Option<String>) {
    if page.objects.recipes().all(|recipe| !recipe.image.is_empty()) {
        return;
    }
    let document = Html::parse_document(&page.cleaned_html);
    let Some(image) = scrape(&document) else {
        return;
    };
    for recipe in page.objects.recipes_mut() {
        if recipe.image.is_empty() {
            recipe.image.push(image.clone());
        }
    }
}

// Dotdash Meredith properties (Allrecipes, Serious Eats) serve images
// through thumbor: /thmb/<signature>/<WxH>/<filters:...>/<file>.
static THUMBOR_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>/thmb/[^/]+)/(?:\d+x\d+/)?(?:filters:[^/]*/)?(?P<file>[^/]+)$")
        .expect("valid thumbor regex")
});
static DOTDASH_SUBHEADING: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[id^="article-subheading"], p.article-subheading"#));

pub struct DotdashNormalizer {
    host: String,
}

impl DotdashNormalizer {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl SiteNormalizer for DotdashNormalizer {
    fn host(&self) -> &str {
        &self.host
    }

    /// Drops the size and filter segments so every resize variant of one
    /// upload maps to the same URL.
    fn normalize_image_url(&self, raw: &str) -> Option<String> {
        let mut url = Url::parse(&strip_query(raw)?).ok()?;
        let rewritten = THUMBOR_PATH
            .captures(url.path())
            .map(|caps| format!("{}/{}", &caps["prefix"], &caps["file"]));
        if let Some(path) = rewritten {
            url.set_path(&path);
        }
        Some(url.to_string())
    }

    fn normalize_site(&self, mut page: SitePage) -> Result<SitePage, NormalizeError> {
        backfill_description(&mut page, |document| first_text(document, &DOTDASH_SUBHEADING));
        backfill_image(&mut page, |document| first_attr(document, &OG_IMAGE, "content"));
        Ok(page)
    }
}

static NYT_AUTHOR_LINKS: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href*="/by/"]"#));
static NYT_TOPNOTE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[class*="topnote"] p, [class*="topnote"]"#));

/// NYT Cooking: author profiles are only linked from the page body and the
/// recipe description lives in the "topnote" block.
pub struct NytCookingNormalizer;

impl SiteNormalizer for NytCookingNormalizer {
    fn host(&self) -> &str {
        "cooking.nytimes.com"
    }

    fn urls_to_queue(&self, page: &SitePage) -> Vec<String> {
        let Ok(base) = page_url(&page.url) else {
            return Vec::new();
        };
        let document = Html::parse_document(&page.cleaned_html);
        links(&document, &NYT_AUTHOR_LINKS, &base)
            .into_iter()
            .filter(|url| url.starts_with("https://cooking.nytimes.com/by/"))
            .collect()
    }

    fn normalize_image_url(&self, raw: &str) -> Option<String> {
        strip_query(raw)
    }

    fn normalize_site(&self, mut page: SitePage) -> Result<SitePage, NormalizeError> {
        page_url(&page.url)?;
        backfill_description(&mut page, |document| first_text(document, &NYT_TOPNOTE));
        Ok(page)
    }
}

// WordPress writes resized copies as <name>-<W>x<H>.<ext>.
static WP_SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+x\d+(?P<ext>\.[A-Za-z0-9]+)$").expect("valid size regex"));

/// Budget Bytes: Yoast graph with authors referenced by `@id`.
pub struct BudgetBytesNormalizer;

impl SiteNormalizer for BudgetBytesNormalizer {
    fn host(&self) -> &str {
        "www.budgetbytes.com"
    }

    fn normalize_image_url(&self, raw: &str) -> Option<String> {
        let mut url = Url::parse(&strip_query(raw)?).ok()?;
        let path = WP_SIZE_SUFFIX.replace(url.path(), "$ext").into_owned();
        url.set_path(&path);
        Some(url.to_string())
    }

    fn normalize_site(&self, mut page: SitePage) -> Result<SitePage, NormalizeError> {
        resolve_author_references(&mut page.objects)?;
        backfill_image(&mut page, |document| first_attr(document, &OG_IMAGE, "content"));
        Ok(page)
    }
}

static BBC_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#".post-header__description, .recipe-header__description, [class*="editor-content"] p"#)
});

pub struct BbcGoodFoodNormalizer;

impl SiteNormalizer for BbcGoodFoodNormalizer {
    fn host(&self) -> &str {
        "www.bbcgoodfood.com"
    }

    /// Images come from an Immediate Media CDN that resizes via `?resize=`.
    fn normalize_image_url(&self, raw: &str) -> Option<String> {
        strip_query(raw)
    }

    fn normalize_site(&self, mut page: SitePage) -> Result<SitePage, NormalizeError> {
        backfill_description(&mut page, |document| {
            first_text(document, &BBC_DESCRIPTION)
                .or_else(|| first_attr(document, &META_DESCRIPTION, "content"))
        });
        Ok(page)
    }
}
