use serde::Deserialize;
use serde_json::Value;

use super::values::{self, AggregateRating, AuthorRef, InstructionStep, ListItemRef};

/// Structured-data vocabulary the grouper understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaType {
    Recipe,
    Person,
    Organization,
    WebPage,
    CollectionPage,
    WebSite,
    ImageObject,
    ItemList,
    BreadcrumbList,
    ProfilePage,
}

const TAGS: &[(&str, SchemaType)] = &[
    ("Recipe", SchemaType::Recipe),
    ("Person", SchemaType::Person),
    ("Organization", SchemaType::Organization),
    ("WebPage", SchemaType::WebPage),
    ("CollectionPage", SchemaType::CollectionPage),
    ("WebSite", SchemaType::WebSite),
    ("ImageObject", SchemaType::ImageObject),
    ("ItemList", SchemaType::ItemList),
    ("BreadcrumbList", SchemaType::BreadcrumbList),
    ("ProfilePage", SchemaType::ProfilePage),
];

impl SchemaType {
    /// Resolves a declared type tag. Accepts bare names as well as
    /// vocabulary-prefixed forms such as `schema:Recipe` or
    /// `https://schema.org/Recipe`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let bare = tag.rsplit(['/', ':']).next().unwrap_or(tag).trim();
        TAGS.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(bare))
            .map(|(_, kind)| *kind)
    }

    pub fn name(self) -> &'static str {
        TAGS.iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("Unknown")
    }

    pub fn decode(self, value: Value) -> Result<SchemaObject, serde_json::Error> {
        Ok(match self {
            SchemaType::Recipe => SchemaObject::Recipe(serde_json::from_value(value)?),
            SchemaType::Person => SchemaObject::Person(serde_json::from_value(value)?),
            SchemaType::Organization => SchemaObject::Organization(serde_json::from_value(value)?),
            SchemaType::WebPage => SchemaObject::WebPage(serde_json::from_value(value)?),
            SchemaType::CollectionPage => {
                SchemaObject::CollectionPage(serde_json::from_value(value)?)
            }
            SchemaType::WebSite => SchemaObject::WebSite(serde_json::from_value(value)?),
            SchemaType::ImageObject => SchemaObject::ImageObject(serde_json::from_value(value)?),
            SchemaType::ItemList => SchemaObject::ItemList(serde_json::from_value(value)?),
            SchemaType::BreadcrumbList => {
                SchemaObject::BreadcrumbList(serde_json::from_value(value)?)
            }
            SchemaType::ProfilePage => SchemaObject::ProfilePage(serde_json::from_value(value)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaObject {
    Recipe(RecipeData),
    Person(PersonData),
    Organization(OrganizationData),
    WebPage(WebPageData),
    CollectionPage(WebPageData),
    WebSite(WebSiteData),
    ImageObject(ImageObjectData),
    ItemList(ItemListData),
    BreadcrumbList(ItemListData),
    ProfilePage(ProfilePageData),
}

impl SchemaObject {
    pub fn schema_type(&self) -> SchemaType {
        match self {
            SchemaObject::Recipe(_) => SchemaType::Recipe,
            SchemaObject::Person(_) => SchemaType::Person,
            SchemaObject::Organization(_) => SchemaType::Organization,
            SchemaObject::WebPage(_) => SchemaType::WebPage,
            SchemaObject::CollectionPage(_) => SchemaType::CollectionPage,
            SchemaObject::WebSite(_) => SchemaType::WebSite,
            SchemaObject::ImageObject(_) => SchemaType::ImageObject,
            SchemaObject::ItemList(_) => SchemaType::ItemList,
            SchemaObject::BreadcrumbList(_) => SchemaType::BreadcrumbList,
            SchemaObject::ProfilePage(_) => SchemaType::ProfilePage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecipeData {
    #[serde(rename = "@id", deserialize_with = "values::reference")]
    pub id: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "values::reference")]
    pub url: Option<String>,
    #[serde(deserialize_with = "values::reference")]
    pub main_entity_of_page: Option<String>,
    #[serde(deserialize_with = "values::authors")]
    pub author: Vec<AuthorRef>,
    #[serde(deserialize_with = "values::image_urls")]
    pub image: Vec<String>,
    #[serde(alias = "ingredients", deserialize_with = "values::text_list")]
    pub recipe_ingredient: Vec<String>,
    #[serde(deserialize_with = "values::instructions")]
    pub recipe_instructions: Vec<InstructionStep>,
    #[serde(deserialize_with = "values::text_list")]
    pub recipe_yield: Vec<String>,
    #[serde(deserialize_with = "values::text")]
    pub prep_time: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub cook_time: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub total_time: Option<String>,
    #[serde(deserialize_with = "values::rating")]
    pub aggregate_rating: Option<AggregateRating>,
    #[serde(deserialize_with = "values::keyword_list")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "values::text_list")]
    pub recipe_category: Vec<String>,
    #[serde(deserialize_with = "values::text_list")]
    pub recipe_cuisine: Vec<String>,
}

impl RecipeData {
    /// URL the publisher declares as the recipe's home, if any.
    pub fn canonical_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.main_entity_of_page.as_deref())
            .filter(|url| url.starts_with("http"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonData {
    #[serde(rename = "@id", deserialize_with = "values::reference")]
    pub id: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "values::reference")]
    pub url: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "values::image_urls")]
    pub image: Vec<String>,
    #[serde(deserialize_with = "values::text_list")]
    pub same_as: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizationData {
    #[serde(rename = "@id", deserialize_with = "values::reference")]
    pub id: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "values::reference")]
    pub url: Option<String>,
    #[serde(deserialize_with = "values::image_urls")]
    pub logo: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebPageData {
    #[serde(rename = "@id", deserialize_with = "values::reference")]
    pub id: Option<String>,
    #[serde(deserialize_with = "values::reference")]
    pub url: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "values::reference")]
    pub breadcrumb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebSiteData {
    #[serde(rename = "@id", deserialize_with = "values::reference")]
    pub id: Option<String>,
    #[serde(deserialize_with = "values::reference")]
    pub url: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageObjectData {
    #[serde(rename = "@id", deserialize_with = "values::reference")]
    pub id: Option<String>,
    #[serde(alias = "contentUrl", deserialize_with = "values::reference")]
    pub url: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub caption: Option<String>,
}

/// Shared by `ItemList` and `BreadcrumbList`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemListData {
    #[serde(rename = "@id", deserialize_with = "values::reference")]
    pub id: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "values::list_items")]
    pub item_list_element: Vec<ListItemRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePageData {
    #[serde(rename = "@id", deserialize_with = "values::reference")]
    pub id: Option<String>,
    #[serde(deserialize_with = "values::reference")]
    pub url: Option<String>,
    #[serde(deserialize_with = "values::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "values::person")]
    pub main_entity: Option<PersonData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefixed_tags_resolve() {
        assert_eq!(SchemaType::from_tag("Recipe"), Some(SchemaType::Recipe));
        assert_eq!(SchemaType::from_tag("schema:Recipe"), Some(SchemaType::Recipe));
        assert_eq!(
            SchemaType::from_tag("https://schema.org/BreadcrumbList"),
            Some(SchemaType::BreadcrumbList)
        );
        assert_eq!(SchemaType::from_tag("NewsArticle"), None);
    }

    #[test]
    fn recipe_fields_accept_loose_shapes() {
        let value = json!({
            "@type": "Recipe",
            "name": ["Tomato Soup"],
            "image": {"@type": "ImageObject", "url": "https://img.example/soup.jpg"},
            "author": "Ada Cook",
            "recipeYield": 4,
            "keywords": "soup, tomato,  easy ",
            "aggregateRating": {"ratingValue": "4.5", "ratingCount": 12},
            "recipeInstructions": [
                {"@type": "HowToSection", "name": "Soup", "itemListElement": [
                    {"@type": "HowToStep", "text": "Chop tomatoes."},
                    {"@type": "HowToStep", "text": "Simmer."}
                ]}
            ]
        });
        let SchemaObject::Recipe(recipe) = SchemaType::Recipe.decode(value).unwrap() else {
            panic!("expected recipe");
        };
        assert_eq!(recipe.name.as_deref(), Some("Tomato Soup"));
        assert_eq!(recipe.image, vec!["https://img.example/soup.jpg".to_string()]);
        assert_eq!(recipe.author[0].name.as_deref(), Some("Ada Cook"));
        assert_eq!(recipe.recipe_yield, vec!["4".to_string()]);
        assert_eq!(recipe.keywords, vec!["soup", "tomato", "easy"]);
        assert_eq!(recipe.aggregate_rating.unwrap().count, Some(12));
        assert_eq!(recipe.recipe_instructions.len(), 2);
        assert_eq!(recipe.recipe_instructions[1].section.as_deref(), Some("Soup"));
    }
}
