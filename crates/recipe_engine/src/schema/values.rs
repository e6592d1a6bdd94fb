//! Lenient field decoders for structured-data payloads.
//!
//! Publishers encode the same property in many shapes (text, list, nested
//! object, `@id` reference). Each decoder here accepts all shapes seen in the
//! wild and reduces them to one Rust type.
use std::str::FromStr;
use std::sync::LazyLock;

use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::types::PersonData;

static STEP_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, li").expect("valid step selector"));

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
}

impl AuthorRef {
    /// A bare `{"@id": ...}` pointing at a Person declared elsewhere on the page.
    pub fn is_reference(&self) -> bool {
        self.name.is_none() && self.id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstructionStep {
    pub section: Option<String>,
    pub name: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateRating {
    pub value: Option<Decimal>,
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItemRef {
    pub position: Option<u32>,
    pub url: Option<String>,
    pub name: Option<String>,
}

fn raw<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null))
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(as_text),
        Value::Object(map) => ["@value", "name", "text"]
            .iter()
            .find_map(|key| map.get(*key).and_then(as_text)),
        _ => None,
    }
}

fn as_reference(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Array(items) => items.iter().find_map(as_reference),
        Value::Object(map) => ["@id", "url"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str).and_then(non_empty)),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_text(&raw(deserializer)?))
}

pub fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw(deserializer)? {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        other => as_text(&other).into_iter().collect(),
    })
}

/// Keywords arrive as comma separated text or as a list of such texts.
pub fn keyword_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = raw(deserializer)?;
    let texts: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        other => as_text(&other).into_iter().collect(),
    };
    Ok(texts
        .iter()
        .flat_map(|text| text.split(','))
        .filter_map(non_empty)
        .collect())
}

pub fn reference<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_reference(&raw(deserializer)?))
}

pub fn image_urls<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut urls = Vec::new();
    collect_image_urls(&raw(deserializer)?, &mut urls);
    Ok(urls)
}

fn collect_image_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if let Some(url) = non_empty(s) {
                if !out.contains(&url) {
                    out.push(url);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_image_urls(item, out)),
        Value::Object(map) => {
            if let Some(url) = ["url", "contentUrl", "@id"]
                .iter()
                .find_map(|key| map.get(*key).filter(|v| v.is_string()))
            {
                collect_image_urls(url, out);
            }
        }
        _ => {}
    }
}

pub fn authors<'de, D>(deserializer: D) -> Result<Vec<AuthorRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut authors = Vec::new();
    collect_authors(&raw(deserializer)?, &mut authors);
    Ok(authors)
}

fn collect_authors(value: &Value, out: &mut Vec<AuthorRef>) {
    match value {
        Value::String(s) => {
            if let Some(name) = non_empty(s) {
                out.push(AuthorRef {
                    name: Some(name),
                    ..AuthorRef::default()
                });
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_authors(item, out)),
        Value::Object(map) => {
            let author = AuthorRef {
                id: map.get("@id").and_then(Value::as_str).and_then(non_empty),
                name: map.get("name").and_then(as_text),
                url: map.get("url").and_then(as_reference),
            };
            if author != AuthorRef::default() {
                out.push(author);
            }
        }
        _ => {}
    }
}

pub fn instructions<'de, D>(deserializer: D) -> Result<Vec<InstructionStep>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut steps = Vec::new();
    collect_instructions(&raw(deserializer)?, None, &mut steps);
    Ok(steps)
}

fn collect_instructions(value: &Value, section: Option<&str>, out: &mut Vec<InstructionStep>) {
    match value {
        Value::String(s) if s.contains('<') => {
            let fragment = Html::parse_fragment(s);
            let before = out.len();
            for element in fragment.select(&STEP_SELECTOR) {
                push_step(out, section, None, &element.text().collect::<String>());
            }
            if out.len() == before {
                push_step(out, section, None, &fragment.root_element().text().collect::<String>());
            }
        }
        Value::String(s) => push_step(out, section, None, s),
        Value::Array(items) => items
            .iter()
            .for_each(|item| collect_instructions(item, section, out)),
        Value::Object(map) => {
            let is_section = map
                .get("@type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case("HowToSection"));
            if is_section {
                let name = map.get("name").and_then(as_text);
                if let Some(items) = map.get("itemListElement") {
                    collect_instructions(items, name.as_deref().or(section), out);
                }
                return;
            }
            let name = map.get("name").and_then(as_text);
            let text = map
                .get("text")
                .and_then(as_text)
                .or_else(|| name.clone())
                .unwrap_or_default();
            push_step(out, section, name.filter(|n| *n != text), &text);
        }
        _ => {}
    }
}

fn push_step(out: &mut Vec<InstructionStep>, section: Option<&str>, name: Option<String>, text: &str) {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return;
    }
    out.push(InstructionStep {
        section: section.map(str::to_string),
        name,
        text,
    });
}

pub fn rating<'de, D>(deserializer: D) -> Result<Option<AggregateRating>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = raw(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(None);
    };
    let rating = AggregateRating {
        value: map.get("ratingValue").and_then(as_decimal),
        count: map
            .get("ratingCount")
            .and_then(as_u32)
            .or_else(|| map.get("reviewCount").and_then(as_u32)),
    };
    Ok(rating.value.map(|_| rating))
}

pub fn list_items<'de, D>(deserializer: D) -> Result<Vec<ListItemRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = raw(deserializer)?;
    let items = match &value {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        Value::Object(_) => vec![&value],
        _ => Vec::new(),
    };
    Ok(items.into_iter().filter_map(list_item).collect())
}

fn list_item(value: &Value) -> Option<ListItemRef> {
    let map = value.as_object()?;
    let url = map
        .get("url")
        .and_then(as_reference)
        .or_else(|| map.get("item").and_then(as_reference));
    let name = map
        .get("name")
        .and_then(as_text)
        .or_else(|| map.get("item").and_then(|item| item.get("name")).and_then(as_text));
    Some(ListItemRef {
        position: map.get("position").and_then(as_u32),
        url,
        name,
    })
}

pub fn person<'de, D>(deserializer: D) -> Result<Option<PersonData>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match raw(deserializer)? {
        Value::Array(items) => items.into_iter().find(Value::is_object),
        object @ Value::Object(_) => Some(object),
        _ => None,
    };
    value
        .map(serde_json::from_value::<PersonData>)
        .transpose()
        .map_err(serde::de::Error::custom)
}
