use std::sync::Arc;

use crawl_logging::{crawl_debug, crawl_info};
use recipe_core::{
    parse_ingredient_line, parse_iso_duration_minutes, parse_servings, sentence_case, Author,
    CrawlTarget, ImageRole, Ingredient, IngredientKnowledge, IngredientNameCache, PageKind,
    Recipe, RecipeImage, RecipeRating, Step, StepKind, TargetId,
};
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use crate::enqueue::{enqueue_url, normalize_url};
use crate::error::ProcessError;
use crate::normalize::{SiteNormalizer, SitePage};
use crate::schema::{InstructionStep, PersonData, ProfilePageData, RecipeData, SchemaType};
use crate::store::{CrawlStore, StoreError};

const IMAGE_ROLES: [ImageRole; 2] = [ImageRole::Main, ImageRole::Background];

/// What the processor decided about a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub kind: PageKind,
    pub same_as: Option<TargetId>,
    pub enqueued: usize,
}

/// Hex SHA-256 over the extracted structured-data blocks.
pub fn fingerprint(blocks: &[String]) -> String {
    let mut hasher = Sha256::new();
    for block in blocks {
        hasher.update(block.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Maps a normalized page onto stored entities and feeds discovered links
/// back into the queue.
#[derive(Clone)]
pub struct WrapperProcessor {
    store: Arc<dyn CrawlStore>,
    ingredient_names: Arc<IngredientNameCache>,
}

impl WrapperProcessor {
    pub fn new(store: Arc<dyn CrawlStore>, ingredient_names: Arc<IngredientNameCache>) -> Self {
        Self {
            store,
            ingredient_names,
        }
    }

    /// Classifies `page` and writes its entities. Updates the classification
    /// fields of `target`; persisting the target is left to the caller.
    pub async fn process(
        &self,
        target: &mut CrawlTarget,
        page: &SitePage,
        normalizer: &dyn SiteNormalizer,
    ) -> Result<ProcessOutcome, ProcessError> {
        let recipes = page.objects.count(SchemaType::Recipe);
        let profiles = page.objects.count(SchemaType::ProfilePage);
        if recipes > 1 || profiles > 1 {
            return Err(ProcessError::AmbiguousPage { recipes, profiles });
        }

        let fingerprint = fingerprint(&target.extracted_json);
        target.fingerprint = Some(fingerprint.clone());
        target.same_as = None;

        let recipe = page.objects.recipes().next();
        if let Some(recipe) = recipe {
            if let Some(original) = self.find_original(target, recipe, &fingerprint).await? {
                crawl_info!("{} is the same page as target {original}", target.url);
                target.mark_same_as(original);
                return Ok(ProcessOutcome {
                    kind: PageKind::Duplicate,
                    same_as: Some(original),
                    enqueued: 0,
                });
            }
        }

        target.page_kind = if let Some(recipe) = recipe {
            self.apply_recipe(target, recipe, normalizer).await?;
            PageKind::Recipe
        } else if let Some(profile) = page.objects.profile_pages().next() {
            self.apply_profile(target, profile, normalizer).await?;
            PageKind::Author
        } else {
            PageKind::Breadcrumb
        };

        let enqueued = self.enqueue_discovered(target, page, normalizer).await?;
        Ok(ProcessOutcome {
            kind: target.page_kind,
            same_as: None,
            enqueued,
        })
    }

    /// Another target holding the same recipe, by declared canonical URL or
    /// by identical structured data.
    async fn find_original(
        &self,
        target: &CrawlTarget,
        recipe: &RecipeData,
        fingerprint: &str,
    ) -> Result<Option<TargetId>, StoreError> {
        let base = Url::parse(&target.url).ok();
        let canonical = recipe
            .canonical_url()
            .and_then(|url| normalize_url(url, base.as_ref()))
            .map(String::from);
        if let Some(canonical) = canonical.filter(|url| *url != target.url) {
            if let Some(other) = self.store.target_by_url(&canonical).await? {
                if other.id != target.id {
                    return Ok(Some(other.id));
                }
            }
        }

        let original = self
            .store
            .targets_by_fingerprint(fingerprint)
            .await?
            .into_iter()
            .filter(|other| other.id != target.id && other.page_kind == PageKind::Recipe)
            .map(|other| other.id)
            .min();
        Ok(original)
    }

    async fn apply_recipe(
        &self,
        target: &CrawlTarget,
        data: &RecipeData,
        normalizer: &dyn SiteNormalizer,
    ) -> Result<(), ProcessError> {
        let name = data.name.clone().ok_or(ProcessError::MissingField {
            type_name: "Recipe",
            field: "name",
        })?;

        let mut author_id = None;
        if let Some(reference) = data.author.iter().find(|author| author.name.is_some()) {
            let mut author = Author::new(reference.name.clone().unwrap_or_default());
            author.url = reference.url.clone();
            author_id = Some(self.upsert_author(author).await?.id);
        }

        let existing = self.store.recipe_for_target(target.id).await?;
        let recipe = Recipe {
            id: existing.map(|recipe| recipe.id).unwrap_or_else(Uuid::new_v4),
            target_id: target.id,
            author_id,
            name,
            description: data.description.clone(),
            canonical_url: data.canonical_url().map(str::to_string),
            servings: data.recipe_yield.iter().find_map(|y| parse_servings(y)),
            prep_minutes: data.prep_time.as_deref().and_then(parse_iso_duration_minutes),
            cook_minutes: data.cook_time.as_deref().and_then(parse_iso_duration_minutes),
            total_minutes: data.total_time.as_deref().and_then(parse_iso_duration_minutes),
            rating: data.aggregate_rating.as_ref().and_then(|rating| {
                rating.value.map(|value| RecipeRating {
                    value,
                    count: rating.count,
                })
            }),
        };
        self.store.save_recipe(&recipe).await?;

        let first_step = self.upsert_steps(&recipe, &data.recipe_instructions).await?;
        if let Some(step) = first_step {
            self.replace_first_step_ingredients(step, &data.recipe_ingredient)
                .await?;
        }
        self.record_images(&recipe, &data.image, normalizer).await?;

        for keyword in &data.keywords {
            let tag = self.store.upsert_tag(keyword).await?;
            self.store.link_recipe_tag(recipe.id, tag.id).await?;
        }
        for category in &data.recipe_category {
            let category = self.store.upsert_category(&sentence_case(category)).await?;
            self.store.link_recipe_category(recipe.id, category.id).await?;
        }
        crawl_debug!("Stored recipe {:?} for target {}", recipe.name, target.id);
        Ok(())
    }

    /// Steps are keyed by position. The first of several steps is the prep
    /// step. Returns the first step, which owns the ingredient list.
    async fn upsert_steps(
        &self,
        recipe: &Recipe,
        instructions: &[InstructionStep],
    ) -> Result<Option<Step>, StoreError> {
        let stored = self.store.steps_for_recipe(recipe.id).await?;
        let placeholder;
        let instructions = if instructions.is_empty() {
            // Ingredients still need a step to hang off.
            placeholder = [InstructionStep::default()];
            &placeholder[..]
        } else {
            instructions
        };

        let mut first = None;
        for (index, instruction) in instructions.iter().enumerate() {
            let position = index as u32;
            let kind = if index == 0 && instructions.len() > 1 {
                StepKind::Prep
            } else {
                StepKind::Cooking
            };
            let step = Step {
                id: stored
                    .iter()
                    .find(|step| step.position == position)
                    .map(|step| step.id)
                    .unwrap_or_else(Uuid::new_v4),
                recipe_id: recipe.id,
                position,
                kind,
                title: instruction.name.clone().or_else(|| instruction.section.clone()),
                text: instruction.text.clone(),
            };
            self.store.save_step(&step).await?;
            if index == 0 {
                first = Some(step);
            }
        }
        Ok(first)
    }

    async fn replace_first_step_ingredients(
        &self,
        step: Step,
        lines: &[String],
    ) -> Result<(), StoreError> {
        let mut ingredients = Vec::new();
        let mut unknown = 0;
        for raw in lines {
            for parsed in parse_ingredient_line(raw) {
                if self.ingredient_names.classify(&parsed) == IngredientKnowledge::Unknown {
                    unknown += 1;
                }
                ingredients.push(Ingredient {
                    id: Uuid::new_v4(),
                    step_id: step.id,
                    position: ingredients.len() as u32,
                    raw: raw.clone(),
                    name: parsed.name,
                    quantity: parsed.quantity,
                    measurement: parsed.measurement,
                    notes: parsed.notes,
                });
            }
        }
        crawl_debug!(
            "Parsed {} ingredients from {} lines, {unknown} unknown names",
            ingredients.len(),
            lines.len()
        );
        self.store.replace_ingredients(step.id, ingredients).await
    }

    async fn record_images(
        &self,
        recipe: &Recipe,
        raw_urls: &[String],
        normalizer: &dyn SiteNormalizer,
    ) -> Result<(), StoreError> {
        let mut urls: Vec<String> = Vec::new();
        for url in raw_urls.iter().filter_map(|raw| normalizer.normalize_image_url(raw)) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        let stored = self.store.images_for_recipe(recipe.id).await?;
        for (role, url) in IMAGE_ROLES.into_iter().zip(urls) {
            if stored.iter().any(|image| image.url == url) {
                continue;
            }
            let image = RecipeImage {
                id: Uuid::new_v4(),
                recipe_id: recipe.id,
                url,
                role,
            };
            self.store.save_image(&image).await?;
        }
        Ok(())
    }

    async fn apply_profile(
        &self,
        target: &CrawlTarget,
        profile: &ProfilePageData,
        normalizer: &dyn SiteNormalizer,
    ) -> Result<(), ProcessError> {
        let person = profile.main_entity.clone().unwrap_or_else(|| PersonData {
            name: profile.name.clone(),
            ..PersonData::default()
        });
        let name = person.name.clone().ok_or(ProcessError::MissingField {
            type_name: "ProfilePage",
            field: "name",
        })?;
        let mut author = Author::new(name);
        author.bio = person.description.clone();
        author.url = person
            .url
            .clone()
            .or_else(|| profile.url.clone())
            .or_else(|| Some(target.url.clone()));
        author.image_url = person
            .image
            .iter()
            .find_map(|raw| normalizer.normalize_image_url(raw));
        author.is_visible = true;
        self.upsert_author(author).await?;
        Ok(())
    }

    /// Authors are matched by exact name; a repeat sighting only fills in
    /// what the stored record lacks.
    async fn upsert_author(&self, candidate: Author) -> Result<Author, StoreError> {
        match self.store.author_by_name(&candidate.name).await? {
            Some(mut stored) => {
                if stored.merge_from(&candidate) {
                    self.store.save_author(&stored).await?;
                }
                Ok(stored)
            }
            None => {
                self.store.save_author(&candidate).await?;
                Ok(candidate)
            }
        }
    }

    async fn enqueue_discovered(
        &self,
        target: &CrawlTarget,
        page: &SitePage,
        normalizer: &dyn SiteNormalizer,
    ) -> Result<usize, StoreError> {
        let base = Url::parse(&target.url).ok();
        let mut candidates = page.objects.navigation_urls();
        candidates.extend(
            page.objects
                .recipes()
                .flat_map(|recipe| recipe.author.iter())
                .filter_map(|author| author.url.clone()),
        );
        candidates.extend(normalizer.urls_to_queue(page));

        let mut enqueued = 0;
        for url in candidates {
            if enqueue_url(self.store.as_ref(), &url, base.as_ref())
                .await?
                .is_some()
            {
                enqueued += 1;
            }
        }
        if enqueued > 0 {
            crawl_debug!("Discovered {enqueued} new urls on {}", target.url);
        }
        Ok(enqueued)
    }
}
