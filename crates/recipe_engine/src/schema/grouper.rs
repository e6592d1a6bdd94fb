use std::collections::BTreeMap;

use crawl_logging::crawl_debug;
use serde_json::Value;

use super::types::{PersonData, ProfilePageData, RecipeData, SchemaObject, SchemaType};

const GRAPH_KEY: &str = "@graph";
const TYPE_KEY: &str = "@type";
/// Offending JSON is truncated to this many characters inside errors.
const ERROR_SNIPPET_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("structured data is not valid JSON: {text}")]
    InvalidJson {
        text: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("structured data object has neither @graph nor @type: {text}")]
    MissingType { text: String },
    #[error("unsupported structured data types: {}", .0.join(", "))]
    UnknownTypes(Vec<String>),
    #[error("could not decode {type_name} object")]
    Decode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed objects of one page grouped by declared type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageObjects {
    groups: BTreeMap<SchemaType, Vec<SchemaObject>>,
}

impl PageObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object unless an identical one of the same type is present.
    pub fn insert(&mut self, object: SchemaObject) -> bool {
        let group = self.groups.entry(object.schema_type()).or_default();
        if group.contains(&object) {
            return false;
        }
        group.push(object);
        true
    }

    pub fn get(&self, kind: SchemaType) -> &[SchemaObject] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, kind: SchemaType) -> usize {
        self.get(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    pub fn types(&self) -> impl Iterator<Item = SchemaType> + '_ {
        self.groups
            .iter()
            .filter(|(_, objects)| !objects.is_empty())
            .map(|(kind, _)| *kind)
    }

    pub fn recipes(&self) -> impl Iterator<Item = &RecipeData> {
        self.get(SchemaType::Recipe).iter().filter_map(|object| match object {
            SchemaObject::Recipe(recipe) => Some(recipe),
            _ => None,
        })
    }

    pub fn recipes_mut(&mut self) -> impl Iterator<Item = &mut RecipeData> {
        self.groups
            .get_mut(&SchemaType::Recipe)
            .into_iter()
            .flatten()
            .filter_map(|object| match object {
                SchemaObject::Recipe(recipe) => Some(recipe),
                _ => None,
            })
    }

    pub fn persons(&self) -> impl Iterator<Item = &PersonData> {
        self.get(SchemaType::Person).iter().filter_map(|object| match object {
            SchemaObject::Person(person) => Some(person),
            _ => None,
        })
    }

    pub fn profile_pages(&self) -> impl Iterator<Item = &ProfilePageData> {
        self.get(SchemaType::ProfilePage)
            .iter()
            .filter_map(|object| match object {
                SchemaObject::ProfilePage(page) => Some(page),
                _ => None,
            })
    }

    pub fn person_by_id(&self, id: &str) -> Option<&PersonData> {
        self.persons().find(|person| person.id.as_deref() == Some(id))
    }

    /// Item URLs from navigation lists and breadcrumb trails, in page order.
    pub fn navigation_urls(&self) -> Vec<String> {
        let mut urls = Vec::new();
        for kind in [SchemaType::ItemList, SchemaType::BreadcrumbList] {
            for object in self.get(kind) {
                let (SchemaObject::ItemList(list) | SchemaObject::BreadcrumbList(list)) = object
                else {
                    continue;
                };
                for url in list.item_list_element.iter().filter_map(|item| item.url.clone()) {
                    if !urls.contains(&url) {
                        urls.push(url);
                    }
                }
            }
        }
        urls
    }
}

/// Parses every structured-data block of a page and groups the resulting
/// objects by type. Any malformed block or unsupported type fails the page.
pub fn group_objects(blocks: &[String]) -> Result<PageObjects, SchemaError> {
    let mut members = Vec::new();
    for block in blocks {
        let value: Value = serde_json::from_str(block).map_err(|source| SchemaError::InvalidJson {
            text: snippet(block),
            source,
        })?;
        match value {
            Value::Array(items) => {
                for item in items {
                    explode(item, &mut members)?;
                }
            }
            other => explode(other, &mut members)?,
        }
    }

    let mut unknown = Vec::new();
    let mut typed = Vec::with_capacity(members.len());
    for member in members {
        let tags = type_tags(&member);
        match tags.iter().find_map(|tag| SchemaType::from_tag(tag)) {
            Some(kind) => typed.push((kind, member)),
            None => unknown.extend(tags),
        }
    }
    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(SchemaError::UnknownTypes(unknown));
    }

    let mut objects = PageObjects::new();
    for (kind, member) in typed {
        let object = kind.decode(member).map_err(|source| SchemaError::Decode {
            type_name: kind.name(),
            source,
        })?;
        objects.insert(object);
    }
    crawl_debug!(
        "Grouped {} structured data blocks into {:?}",
        blocks.len(),
        objects.types().map(SchemaType::name).collect::<Vec<_>>()
    );
    Ok(objects)
}

fn explode(value: Value, out: &mut Vec<Value>) -> Result<(), SchemaError> {
    let Value::Object(mut map) = value else {
        return Err(SchemaError::MissingType {
            text: snippet(&value.to_string()),
        });
    };
    if let Some(graph) = map.remove(GRAPH_KEY) {
        match graph {
            Value::Array(items) => {
                for item in items {
                    explode(item, out)?;
                }
            }
            single => explode(single, out)?,
        }
        return Ok(());
    }
    if !map.contains_key(TYPE_KEY) {
        return Err(SchemaError::MissingType {
            text: snippet(&Value::Object(map).to_string()),
        });
    }
    out.push(Value::Object(map));
    Ok(())
}

fn type_tags(value: &Value) -> Vec<String> {
    match value.get(TYPE_KEY) {
        Some(Value::String(tag)) => vec![tag.clone()],
        Some(Value::Array(tags)) => tags
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(other) => vec![other.to_string()],
        None => Vec::new(),
    }
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= ERROR_SNIPPET_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(ERROR_SNIPPET_CHARS).collect();
    cut.push_str("...");
    cut
}
