use scraper::{Html, Selector};
use url::Url;

use super::NormalizeError;
use crate::schema::{PageObjects, PersonData};

/// Parses `raw` as an absolute http(s) URL, dropping any fragment.
pub fn absolute_http_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

/// Drops the query string, which is where most CDNs keep resize options.
pub fn strip_query(raw: &str) -> Option<String> {
    let mut url = Url::parse(&absolute_http_url(raw)?).ok()?;
    url.set_query(None);
    Some(url.to_string())
}

pub(crate) fn page_url(page_url: &str) -> Result<Url, NormalizeError> {
    Url::parse(page_url).map_err(|source| NormalizeError::PageUrl {
        url: page_url.to_string(),
        source,
    })
}

pub(crate) fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|element| {
        let text = element.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (!text.is_empty()).then_some(text)
    })
}

pub(crate) fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document.select(selector).find_map(|element| {
        element
            .value()
            .attr(attr)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Absolute, de-duplicated `href`s of every element matching `selector`.
pub(crate) fn links(document: &Html, selector: &Selector, base: &Url) -> Vec<String> {
    let mut out = Vec::new();
    for element in document.select(selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(mut url) = base.join(href.trim()) else {
            continue;
        };
        url.set_fragment(None);
        url.set_query(None);
        let url = url.to_string();
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

/// Replaces bare `@id` author references on recipes with the Person object
/// declared elsewhere in the same graph.
pub(crate) fn resolve_author_references(objects: &mut PageObjects) -> Result<(), NormalizeError> {
    let persons: Vec<PersonData> = objects.persons().cloned().collect();
    for recipe in objects.recipes_mut() {
        for author in recipe.author.iter_mut().filter(|author| author.is_reference()) {
            let reference = author.id.clone().unwrap_or_default();
            let person = persons
                .iter()
                .find(|person| person.id.as_deref() == Some(reference.as_str()))
                .ok_or_else(|| NormalizeError::UnresolvedAuthor {
                    reference: reference.clone(),
                })?;
            author.name = person.name.clone();
            author.url = author.url.take().or_else(|| person.url.clone());
        }
    }
    Ok(())
}
