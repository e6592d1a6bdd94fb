use std::collections::HashSet;
use std::sync::RwLock;

use crate::ParsedIngredientLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientKnowledge {
    Known,
    Unknown,
}

/// In-memory set of ingredient names already present in the store. Loaded
/// once at startup; lookups are case-insensitive.
#[derive(Debug, Default)]
pub struct IngredientNameCache {
    names: RwLock<HashSet<String>>,
}

impl IngredientNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh<I, S>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fresh: HashSet<String> = names
            .into_iter()
            .map(|name| normalize(name.as_ref()))
            .filter(|name| !name.is_empty())
            .collect();
        let count = fresh.len();
        if let Ok(mut guard) = self.names.write() {
            *guard = fresh;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.names.read().map(|names| names.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn classify(&self, line: &ParsedIngredientLine) -> IngredientKnowledge {
        let known = self
            .names
            .read()
            .map(|names| names.contains(&normalize(&line.name)))
            .unwrap_or(false);
        if known {
            IngredientKnowledge::Known
        } else {
            IngredientKnowledge::Unknown
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
