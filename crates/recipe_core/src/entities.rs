//! Records written to the store by the wrapper processor.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Measurement, TargetId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    /// Set once the author has been seen on a public profile page.
    pub is_visible: bool,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            bio: None,
            url: None,
            image_url: None,
            is_visible: false,
        }
    }

    /// Patch fields from another sighting of the same author, keeping the
    /// richer value for each field. Returns whether anything changed.
    pub fn merge_from(&mut self, other: &Author) -> bool {
        let before = self.clone();
        if richer(other.bio.as_deref(), self.bio.as_deref()) {
            self.bio = other.bio.clone();
        }
        if self.url.is_none() {
            self.url = other.url.clone();
        }
        if self.image_url.is_none() {
            self.image_url = other.image_url.clone();
        }
        self.is_visible |= other.is_visible;
        *self != before
    }
}

fn richer(candidate: Option<&str>, current: Option<&str>) -> bool {
    let candidate_len = candidate.map(|c| c.trim().len()).unwrap_or(0);
    let current_len = current.map(|c| c.trim().len()).unwrap_or(0);
    candidate_len > current_len
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRating {
    pub value: Decimal,
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub target_id: TargetId,
    pub author_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub canonical_url: Option<String>,
    pub servings: Option<u32>,
    pub prep_minutes: Option<u32>,
    pub cook_minutes: Option<u32>,
    pub total_minutes: Option<u32>,
    pub rating: Option<RecipeRating>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    Prep,
    Cooking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub position: u32,
    pub kind: StepKind,
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub step_id: Uuid,
    pub position: u32,
    pub raw: String,
    pub name: String,
    pub quantity: Decimal,
    pub measurement: Measurement,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageRole {
    Main,
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeImage {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub url: String,
    pub role: ImageRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_longer_bio_and_sticky_visibility() {
        let mut stored = Author::new("Jane Doe");
        stored.bio = Some("Cook.".into());
        stored.is_visible = true;

        let mut seen = Author::new("Jane Doe");
        seen.bio = Some("Cook and food writer based in Lisbon.".into());
        seen.url = Some("https://example.com/jane".into());

        assert!(stored.merge_from(&seen));
        assert_eq!(stored.bio, seen.bio);
        assert_eq!(stored.url.as_deref(), Some("https://example.com/jane"));
        assert!(stored.is_visible);

        let shorter = Author {
            bio: Some("Cook".into()),
            ..Author::new("Jane Doe")
        };
        assert!(!stored.merge_from(&shorter));
    }
}
