use std::sync::Arc;

use chrono::Utc;
use pretty_assertions::assert_eq;
use recipe_core::{
    CrawlTarget, ImageRole, IngredientNameCache, Measurement, PageKind, StepKind,
};
use recipe_engine::{
    group_objects, CrawlStore, DefaultNormalizer, Extractor, MemoryStore, ProcessError,
    SitePage, StructuredDataExtractor, WrapperProcessor,
};
use rust_decimal::Decimal;

struct Fixture {
    store: Arc<MemoryStore>,
    processor: WrapperProcessor,
}

impl Fixture {
    fn new() -> Self {
        crawl_logging::initialize_for_tests();
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(IngredientNameCache::new());
        cache.refresh(["garlic"]);
        let processor = WrapperProcessor::new(store.clone(), cache);
        Self { store, processor }
    }

    async fn target(&self, url: &str) -> CrawlTarget {
        let target = CrawlTarget::parse(url, Utc::now()).unwrap();
        let id = self.store.insert_target(target).await.unwrap();
        self.store.target(id).await.unwrap().unwrap()
    }

    async fn process(
        &self,
        target: &mut CrawlTarget,
        html: &str,
    ) -> Result<recipe_engine::ProcessOutcome, ProcessError> {
        let extracted = StructuredDataExtractor.extract(html);
        target.extracted_json = extracted.json_blocks;
        let page = SitePage {
            url: target.url.clone(),
            objects: group_objects(&target.extracted_json).unwrap(),
            cleaned_html: extracted.cleaned_html,
        };
        let outcome = self.processor.process(target, &page, &DefaultNormalizer).await;
        self.store.update_target(target).await.unwrap();
        outcome
    }
}

fn ld_json(json: &str) -> String {
    format!(r#"<html><head><script type="application/ld+json">{json}</script></head><body></body></html>"#)
}

const SOUP: &str = r#"{"@context": "https://schema.org", "@graph": [
  {"@type": "Recipe", "name": "Garlic Soup", "url": "https://soup.example/garlic-soup",
   "author": {"@type": "Person", "name": "Ada Cook", "url": "https://soup.example/authors/ada"},
   "description": "Silky.",
   "image": ["https://soup.example/img/a.jpg", "https://soup.example/img/b.jpg", "https://soup.example/img/c.jpg"],
   "recipeYield": "4 to 5 servings",
   "prepTime": "PT15M", "totalTime": "PT1H5M",
   "aggregateRating": {"ratingValue": 4.6, "ratingCount": "31"},
   "keywords": "soup, garlic",
   "recipeCategory": ["MAIN COURSE"],
   "recipeIngredient": ["2 cloves plus 1 teaspoon minced garlic", "1 1/4 cups stock"],
   "recipeInstructions": [
     {"@type": "HowToStep", "text": "Peel the garlic."},
     {"@type": "HowToStep", "text": "Simmer in stock."}
   ]},
  {"@type": "BreadcrumbList", "itemListElement": [
     {"@type": "ListItem", "position": 1, "item": "https://soup.example/soups/"}
  ]}
]}"#;

#[tokio::test]
async fn recipe_page_writes_all_entities() {
    let fixture = Fixture::new();
    let mut target = fixture.target("https://soup.example/garlic-soup").await;

    let outcome = fixture.process(&mut target, &ld_json(SOUP)).await.unwrap();
    assert_eq!(outcome.kind, PageKind::Recipe);
    assert_eq!(target.page_kind, PageKind::Recipe);
    assert!(target.fingerprint.is_some());

    let state = fixture.store.snapshot().await;
    let recipe = state.recipes.values().next().unwrap();
    assert_eq!(recipe.name, "Garlic Soup");
    assert_eq!(recipe.servings, Some(5));
    assert_eq!(recipe.prep_minutes, Some(15));
    assert_eq!(recipe.total_minutes, Some(65));
    assert_eq!(recipe.rating.as_ref().map(|r| r.count), Some(Some(31)));

    let author = state.authors.values().next().unwrap();
    assert_eq!(author.name, "Ada Cook");
    assert_eq!(recipe.author_id, Some(author.id));
    assert!(!author.is_visible);

    let steps = fixture.store.steps_for_recipe(recipe.id).await.unwrap();
    assert_eq!(
        steps.iter().map(|s| s.kind).collect::<Vec<_>>(),
        vec![StepKind::Prep, StepKind::Cooking]
    );
    let ingredients = fixture.store.ingredients_for_step(steps[0].id).await.unwrap();
    assert_eq!(ingredients.len(), 3);
    assert_eq!(ingredients[0].measurement, Measurement::Clove);
    assert_eq!(ingredients[1].measurement, Measurement::Teaspoon);
    assert_eq!(ingredients[2].quantity, Decimal::new(125, 2));
    assert!(fixture
        .store
        .ingredients_for_step(steps[1].id)
        .await
        .unwrap()
        .is_empty());

    let mut images = fixture.store.images_for_recipe(recipe.id).await.unwrap();
    images.sort_by_key(|image| image.url.clone());
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].role, ImageRole::Main);
    assert_eq!(images[1].role, ImageRole::Background);

    let tags: Vec<String> = fixture
        .store
        .recipe_tags(recipe.id)
        .await
        .unwrap()
        .into_iter()
        .map(|tag| tag.name)
        .collect();
    assert_eq!(tags.len(), 2);
    assert!(tags.contains(&"garlic".to_string()));
    let categories = fixture.store.recipe_categories(recipe.id).await.unwrap();
    assert_eq!(categories[0].name, "Main course");

    // Breadcrumb trail and author profile both land in the queue.
    assert_eq!(outcome.enqueued, 2);
    assert!(fixture
        .store
        .target_by_url("https://soup.example/authors/ada")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn reprocessing_updates_in_place() {
    let fixture = Fixture::new();
    let mut target = fixture.target("https://soup.example/garlic-soup").await;
    fixture.process(&mut target, &ld_json(SOUP)).await.unwrap();
    fixture.process(&mut target, &ld_json(SOUP)).await.unwrap();

    let state = fixture.store.snapshot().await;
    assert_eq!(state.recipes.len(), 1);
    assert_eq!(state.authors.len(), 1);
    assert_eq!(state.steps.len(), 2);
    assert_eq!(state.ingredients.len(), 3);
    assert_eq!(state.images.len(), 2);
    assert_eq!(state.tags.len(), 2);
}

#[tokio::test]
async fn two_recipes_fail_without_partial_writes() {
    let fixture = Fixture::new();
    let mut target = fixture.target("https://soup.example/two").await;
    let json = r#"[{"@context": "https://schema.org", "@type": "Recipe", "name": "One", "author": "Ada Cook"},
                   {"@context": "https://schema.org", "@type": "Recipe", "name": "Two", "author": "Bob Baker"}]"#;

    let err = fixture.process(&mut target, &ld_json(json)).await.unwrap_err();
    assert!(matches!(
        err,
        ProcessError::AmbiguousPage {
            recipes: 2,
            profiles: 0
        }
    ));
    let state = fixture.store.snapshot().await;
    assert!(state.recipes.is_empty());
    assert!(state.authors.is_empty());
    assert_eq!(state.targets.len(), 1);
}

#[tokio::test]
async fn canonical_url_of_existing_target_marks_duplicate() {
    let fixture = Fixture::new();
    let original = fixture.target("https://soup.example/garlic-soup").await;
    let mut mirror = fixture.target("https://soup.example/print/garlic-soup").await;

    let outcome = fixture.process(&mut mirror, &ld_json(SOUP)).await.unwrap();
    assert_eq!(outcome.kind, PageKind::Duplicate);
    assert_eq!(mirror.same_as, Some(original.id));
    assert!(fixture.store.snapshot().await.recipes.is_empty());
}

#[tokio::test]
async fn identical_structured_data_marks_duplicate() {
    let fixture = Fixture::new();
    let json = r#"{"@context": "https://schema.org", "@type": "Recipe", "name": "Bread"}"#;
    let mut first = fixture.target("https://bread.example/a").await;
    let mut second = fixture.target("https://bread.example/b").await;

    fixture.process(&mut first, &ld_json(json)).await.unwrap();
    let outcome = fixture.process(&mut second, &ld_json(json)).await.unwrap();
    assert_eq!(outcome.same_as, Some(first.id));
    assert_eq!(second.page_kind, PageKind::Duplicate);
    assert_eq!(fixture.store.snapshot().await.recipes.len(), 1);
}

#[tokio::test]
async fn profile_page_creates_visible_author() {
    let fixture = Fixture::new();
    let mut target = fixture.target("https://soup.example/authors/ada").await;
    let json = r#"{"@context": "https://schema.org", "@type": "ProfilePage",
        "mainEntity": {"@type": "Person", "name": "Ada Cook", "description": "Writes about soup."}}"#;

    let outcome = fixture.process(&mut target, &ld_json(json)).await.unwrap();
    assert_eq!(outcome.kind, PageKind::Author);
    let state = fixture.store.snapshot().await;
    let author = state.authors.values().next().unwrap();
    assert!(author.is_visible);
    assert_eq!(author.bio.as_deref(), Some("Writes about soup."));
    assert_eq!(author.url.as_deref(), Some("https://soup.example/authors/ada"));
}

#[tokio::test]
async fn navigation_page_only_enqueues_links() {
    let fixture = Fixture::new();
    let mut target = fixture.target("https://soup.example/soups/").await;
    let json = r#"{"@context": "https://schema.org", "@type": "ItemList", "itemListElement": [
        {"@type": "ListItem", "position": 1, "url": "/garlic-soup"},
        {"@type": "ListItem", "position": 2, "url": "https://soup.example/onion-soup"},
        {"@type": "ListItem", "position": 3, "url": "https://soup.example/soups/"}
    ]}"#;

    let outcome = fixture.process(&mut target, &ld_json(json)).await.unwrap();
    assert_eq!(outcome.kind, PageKind::Breadcrumb);
    assert_eq!(outcome.enqueued, 2);
    let state = fixture.store.snapshot().await;
    assert!(state.recipes.is_empty());
    assert_eq!(state.targets.len(), 3);
}

#[tokio::test]
async fn oversized_numbers_in_scraped_recipe_are_tolerated() {
    let fixture = Fixture::new();
    let mut target = fixture.target("https://soup.example/giant-soup").await;
    let json = r#"{"@context": "https://schema.org", "@type": "Recipe", "name": "Giant Soup",
      "recipeYield": "4000000000 to 4000000000",
      "prepTime": "P9999999D", "cookTime": "PT99999999999H",
      "recipeIngredient": ["1 teaspoon plus 9999999999999999999999999999 quarts water"]}"#;

    let outcome = fixture.process(&mut target, &ld_json(json)).await.unwrap();
    assert_eq!(outcome.kind, PageKind::Recipe);

    let state = fixture.store.snapshot().await;
    let recipe = state.recipes.values().next().unwrap();
    assert_eq!(recipe.servings, Some(4_000_000_000));
    assert_eq!(recipe.prep_minutes, None);
    assert_eq!(recipe.cook_minutes, None);
    let steps = fixture.store.steps_for_recipe(recipe.id).await.unwrap();
    let ingredients = fixture.store.ingredients_for_step(steps[0].id).await.unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0].measurement, Measurement::Teaspoon);
}
