use pretty_assertions::assert_eq;
use recipe_engine::schema::{SchemaObject, SchemaType};
use recipe_engine::{group_objects, SchemaError};

fn blocks(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|text| text.to_string()).collect()
}

#[test]
fn graph_container_is_exploded_by_type() {
    let json = r#"{"@context": "https://schema.org", "@graph": [
        {"@type": "WebSite", "@id": "https://site.example/#website", "name": "Site"},
        {"@type": "WebPage", "@id": "https://site.example/soup/", "url": "https://site.example/soup/"},
        {"@type": "Person", "@id": "https://site.example/#/person/1", "name": "Ada Cook"},
        {"@type": "Recipe", "name": "Soup", "author": {"@id": "https://site.example/#/person/1"}},
        {"@type": "BreadcrumbList", "itemListElement": [
            {"@type": "ListItem", "position": 1, "item": {"@id": "https://site.example/", "name": "Home"}},
            {"@type": "ListItem", "position": 2, "item": "https://site.example/soups/"}
        ]}
    ]}"#;
    let objects = group_objects(&blocks(&[json])).unwrap();
    assert_eq!(objects.count(SchemaType::Recipe), 1);
    assert_eq!(objects.count(SchemaType::Person), 1);
    assert_eq!(objects.count(SchemaType::WebPage), 1);
    assert_eq!(objects.count(SchemaType::WebSite), 1);
    assert_eq!(
        objects.navigation_urls(),
        vec![
            "https://site.example/".to_string(),
            "https://site.example/soups/".to_string()
        ]
    );
    let recipe = objects.recipes().next().unwrap();
    assert!(recipe.author[0].is_reference());
    assert_eq!(
        objects.person_by_id("https://site.example/#/person/1").and_then(|p| p.name.as_deref()),
        Some("Ada Cook")
    );
}

#[test]
fn top_level_array_and_identical_objects_are_deduplicated() {
    let recipe = r#"{"@context": "https://schema.org", "@type": "Recipe", "name": "Soup"}"#;
    let array = format!("[{recipe}, {recipe}]");
    let objects = group_objects(&blocks(&[recipe, &array])).unwrap();
    assert_eq!(objects.count(SchemaType::Recipe), 1);
}

#[test]
fn type_arrays_use_first_known_tag() {
    let json = r#"{"@context": "https://schema.org", "@type": ["HowTo", "Recipe"], "name": "Soup"}"#;
    let objects = group_objects(&blocks(&[json])).unwrap();
    assert!(matches!(objects.get(SchemaType::Recipe), [SchemaObject::Recipe(_)]));
}

#[test]
fn unknown_types_fail_loudly_with_their_names() {
    let json = r#"{"@context": "https://schema.org", "@graph": [
        {"@type": "Recipe", "name": "Soup"},
        {"@type": "NewsArticle"},
        {"@type": ["Event", "Festival"]}
    ]}"#;
    match group_objects(&blocks(&[json])) {
        Err(SchemaError::UnknownTypes(types)) => {
            assert_eq!(types, vec!["Event", "Festival", "NewsArticle"]);
        }
        other => panic!("expected unknown types, got {other:?}"),
    }
}

#[test]
fn invalid_json_carries_offending_text() {
    let err = group_objects(&blocks(&["{\"@type\": \"Recipe\", "])).unwrap_err();
    match err {
        SchemaError::InvalidJson { text, .. } => assert!(text.contains("Recipe")),
        other => panic!("expected invalid json, got {other:?}"),
    }
}

#[test]
fn object_without_graph_or_type_is_rejected() {
    let err = group_objects(&blocks(&[r#"{"@context": "https://schema.org", "name": "?"}"#]))
        .unwrap_err();
    assert!(matches!(err, SchemaError::MissingType { .. }));
}

#[test]
fn no_blocks_group_to_nothing() {
    let objects = group_objects(&[]).unwrap();
    assert!(objects.is_empty());
}
