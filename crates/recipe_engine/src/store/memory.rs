use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crawl_logging::crawl_info;
use recipe_core::{
    Author, Category, CrawlTarget, Ingredient, ParserVersion, Recipe, RecipeImage, Step, Tag,
    TargetId,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CrawlStore, StoreError};
use crate::persist::{read_if_exists, write_atomically, PersistError};

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub next_target_id: TargetId,
    pub targets: BTreeMap<TargetId, CrawlTarget>,
    pub authors: BTreeMap<Uuid, Author>,
    pub recipes: BTreeMap<Uuid, Recipe>,
    pub steps: BTreeMap<Uuid, Step>,
    pub ingredients: BTreeMap<Uuid, Ingredient>,
    pub images: BTreeMap<Uuid, RecipeImage>,
    pub tags: BTreeMap<Uuid, Tag>,
    pub categories: BTreeMap<Uuid, Category>,
    pub recipe_tags: BTreeSet<(Uuid, Uuid)>,
    pub recipe_categories: BTreeSet<(Uuid, Uuid)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.clone()
    }

    /// Loads a snapshot file; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let Some(content) = read_if_exists(path)? else {
            crawl_info!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        };
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        crawl_info!(
            "Loaded snapshot {} with {} targets",
            path.display(),
            snapshot.targets.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub async fn save(&self, path: &Path) -> Result<(), PersistError> {
        let content = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)?
        };
        write_atomically(path, &content)?;
        crawl_info!("Saved snapshot to {}", path.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl CrawlStore for MemoryStore {
    async fn target(&self, id: TargetId) -> Result<Option<CrawlTarget>, StoreError> {
        Ok(self.state.read().await.targets.get(&id).cloned())
    }

    async fn target_by_url(&self, url: &str) -> Result<Option<CrawlTarget>, StoreError> {
        let state = self.state.read().await;
        Ok(state.targets.values().find(|t| t.url == url).cloned())
    }

    async fn targets_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Vec<CrawlTarget>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .targets
            .values()
            .filter(|t| t.fingerprint.as_deref() == Some(fingerprint))
            .cloned()
            .collect())
    }

    async fn insert_target(&self, target: CrawlTarget) -> Result<TargetId, StoreError> {
        let url = target.url.clone();
        self.insert_target_if_absent(target)
            .await?
            .ok_or(StoreError::DuplicateUrl(url))
    }

    async fn insert_target_if_absent(
        &self,
        mut target: CrawlTarget,
    ) -> Result<Option<TargetId>, StoreError> {
        let mut state = self.state.write().await;
        if state.targets.values().any(|t| t.url == target.url) {
            return Ok(None);
        }
        state.next_target_id += 1;
        target.id = state.next_target_id;
        let id = target.id;
        state.targets.insert(id, target);
        Ok(Some(id))
    }

    async fn update_target(&self, target: &CrawlTarget) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let slot = state
            .targets
            .get_mut(&target.id)
            .ok_or(StoreError::TargetNotFound(target.id))?;
        *slot = target.clone();
        Ok(())
    }

    async fn pending_hosts(&self) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().await;
        let hosts: BTreeSet<&str> = state
            .targets
            .values()
            .filter(|t| t.status.is_pending())
            .map(|t| t.host.as_str())
            .collect();
        Ok(hosts.into_iter().map(str::to_string).collect())
    }

    async fn next_pending_for_host(&self, host: &str) -> Result<Option<CrawlTarget>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .targets
            .values()
            .filter(|t| t.host == host && t.status.is_pending())
            .min_by_key(|t| (t.updated_at, t.id))
            .cloned())
    }

    async fn outdated_targets(
        &self,
        latest: ParserVersion,
    ) -> Result<Vec<CrawlTarget>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .targets
            .values()
            .filter(|t| t.status.is_terminal() && t.parser_version.is_outdated(latest))
            .cloned()
            .collect())
    }

    async fn author_by_name(&self, name: &str) -> Result<Option<Author>, StoreError> {
        let state = self.state.read().await;
        Ok(state.authors.values().find(|a| a.name == name).cloned())
    }

    async fn save_author(&self, author: &Author) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.authors.insert(author.id, author.clone());
        Ok(())
    }

    async fn recipe_for_target(&self, target_id: TargetId) -> Result<Option<Recipe>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .recipes
            .values()
            .find(|r| r.target_id == target_id)
            .cloned())
    }

    async fn save_recipe(&self, recipe: &Recipe) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.recipes.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn steps_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<Step>, StoreError> {
        let state = self.state.read().await;
        let mut steps: Vec<Step> = state
            .steps
            .values()
            .filter(|s| s.recipe_id == recipe_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.position);
        Ok(steps)
    }

    async fn save_step(&self, step: &Step) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.steps.insert(step.id, step.clone());
        Ok(())
    }

    async fn ingredients_for_step(&self, step_id: Uuid) -> Result<Vec<Ingredient>, StoreError> {
        let state = self.state.read().await;
        let mut ingredients: Vec<Ingredient> = state
            .ingredients
            .values()
            .filter(|i| i.step_id == step_id)
            .cloned()
            .collect();
        ingredients.sort_by_key(|i| i.position);
        Ok(ingredients)
    }

    async fn replace_ingredients(
        &self,
        step_id: Uuid,
        ingredients: Vec<Ingredient>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.ingredients.retain(|_, i| i.step_id != step_id);
        for ingredient in ingredients {
            state.ingredients.insert(ingredient.id, ingredient);
        }
        Ok(())
    }

    async fn images_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<RecipeImage>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .images
            .values()
            .filter(|i| i.recipe_id == recipe_id)
            .cloned()
            .collect())
    }

    async fn save_image(&self, image: &RecipeImage) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.images.insert(image.id, image.clone());
        Ok(())
    }

    async fn upsert_tag(&self, name: &str) -> Result<Tag, StoreError> {
        let mut state = self.state.write().await;
        if let Some(tag) = state.tags.values().find(|t| t.name == name) {
            return Ok(tag.clone());
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn upsert_category(&self, name: &str) -> Result<Category, StoreError> {
        let mut state = self.state.write().await;
        if let Some(category) = state.categories.values().find(|c| c.name == name) {
            return Ok(category.clone());
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn link_recipe_tag(&self, recipe_id: Uuid, tag_id: Uuid) -> Result<(), StoreError> {
        self.state.write().await.recipe_tags.insert((recipe_id, tag_id));
        Ok(())
    }

    async fn link_recipe_category(
        &self,
        recipe_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .recipe_categories
            .insert((recipe_id, category_id));
        Ok(())
    }

    async fn recipe_tags(&self, recipe_id: Uuid) -> Result<Vec<Tag>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .recipe_tags
            .iter()
            .filter(|(recipe, _)| *recipe == recipe_id)
            .filter_map(|(_, tag)| state.tags.get(tag).cloned())
            .collect())
    }

    async fn recipe_categories(&self, recipe_id: Uuid) -> Result<Vec<Category>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .recipe_categories
            .iter()
            .filter(|(recipe, _)| *recipe == recipe_id)
            .filter_map(|(_, category)| state.categories.get(category).cloned())
            .collect())
    }

    async fn ingredient_names(&self) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().await;
        let names: BTreeSet<&str> = state.ingredients.values().map(|i| i.name.as_str()).collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }
}
