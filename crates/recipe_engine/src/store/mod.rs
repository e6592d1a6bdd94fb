//! Persistence seam. The engine only ever talks to [`CrawlStore`]; the
//! in-memory implementation doubles as the snapshot-backed store for the
//! binary and as the store used by tests.
use recipe_core::{
    Author, Category, CrawlTarget, Ingredient, ParserVersion, Recipe, RecipeImage, Step, Tag,
    TargetId,
};
use uuid::Uuid;

mod memory;

pub use memory::{MemoryStore, StoreSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("target {0} not found")]
    TargetNotFound(TargetId),
    #[error("a target for {0} already exists")]
    DuplicateUrl(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait CrawlStore: Send + Sync {
    async fn target(&self, id: TargetId) -> Result<Option<CrawlTarget>, StoreError>;
    async fn target_by_url(&self, url: &str) -> Result<Option<CrawlTarget>, StoreError>;
    async fn targets_by_fingerprint(&self, fingerprint: &str)
        -> Result<Vec<CrawlTarget>, StoreError>;
    /// Assigns and returns a fresh id. Fails if the URL is already tracked.
    async fn insert_target(&self, target: CrawlTarget) -> Result<TargetId, StoreError>;
    /// Atomic check-and-insert keyed by exact URL. `None` when already present.
    async fn insert_target_if_absent(
        &self,
        target: CrawlTarget,
    ) -> Result<Option<TargetId>, StoreError>;
    async fn update_target(&self, target: &CrawlTarget) -> Result<(), StoreError>;
    /// Distinct hosts with at least one `NotStarted` or `Downloading` target.
    async fn pending_hosts(&self) -> Result<Vec<String>, StoreError>;
    /// Least recently touched pending target of `host`.
    async fn next_pending_for_host(&self, host: &str) -> Result<Option<CrawlTarget>, StoreError>;
    /// Terminal targets whose non-zero parser version is older than `latest`.
    async fn outdated_targets(&self, latest: ParserVersion)
        -> Result<Vec<CrawlTarget>, StoreError>;

    async fn author_by_name(&self, name: &str) -> Result<Option<Author>, StoreError>;
    async fn save_author(&self, author: &Author) -> Result<(), StoreError>;

    async fn recipe_for_target(&self, target_id: TargetId) -> Result<Option<Recipe>, StoreError>;
    async fn save_recipe(&self, recipe: &Recipe) -> Result<(), StoreError>;

    async fn steps_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<Step>, StoreError>;
    async fn save_step(&self, step: &Step) -> Result<(), StoreError>;
    async fn ingredients_for_step(&self, step_id: Uuid) -> Result<Vec<Ingredient>, StoreError>;
    /// Drops every ingredient of `step_id` and stores `ingredients` instead.
    async fn replace_ingredients(
        &self,
        step_id: Uuid,
        ingredients: Vec<Ingredient>,
    ) -> Result<(), StoreError>;

    async fn images_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<RecipeImage>, StoreError>;
    async fn save_image(&self, image: &RecipeImage) -> Result<(), StoreError>;

    /// Exact name match, created when missing.
    async fn upsert_tag(&self, name: &str) -> Result<Tag, StoreError>;
    async fn upsert_category(&self, name: &str) -> Result<Category, StoreError>;
    async fn link_recipe_tag(&self, recipe_id: Uuid, tag_id: Uuid) -> Result<(), StoreError>;
    async fn link_recipe_category(
        &self,
        recipe_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), StoreError>;
    async fn recipe_tags(&self, recipe_id: Uuid) -> Result<Vec<Tag>, StoreError>;
    async fn recipe_categories(&self, recipe_id: Uuid) -> Result<Vec<Category>, StoreError>;

    /// Every distinct ingredient name recorded so far.
    async fn ingredient_names(&self) -> Result<Vec<String>, StoreError>;
}
