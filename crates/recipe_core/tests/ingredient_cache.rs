use recipe_core::{
    parse_ingredient_line, IngredientKnowledge, IngredientNameCache,
};

fn init_logging() {
    crawl_logging::initialize_for_tests();
}

#[test]
fn cache_classifies_parsed_names_case_insensitively() {
    init_logging();
    let cache = IngredientNameCache::new();
    assert!(cache.is_empty());

    let loaded = cache.refresh(["Kosher Salt", "raisins", "  "]);
    assert_eq!(loaded, 2);

    let salt = &parse_ingredient_line("1 teaspoon kosher salt")[0];
    let saffron = &parse_ingredient_line("1 pinch saffron")[0];
    assert_eq!(cache.classify(salt), IngredientKnowledge::Known);
    assert_eq!(cache.classify(saffron), IngredientKnowledge::Unknown);
}

#[test]
fn refresh_replaces_previous_names() {
    init_logging();
    let cache = IngredientNameCache::new();
    cache.refresh(["butter"]);
    cache.refresh(["sugar"]);
    let butter = &parse_ingredient_line("2 tablespoons butter")[0];
    assert_eq!(cache.classify(butter), IngredientKnowledge::Unknown);
    assert_eq!(cache.len(), 1);
}
