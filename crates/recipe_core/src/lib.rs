//! Recipe crawler core: pure domain types, the crawl target state machine and
//! the ingredient line parser.
mod entities;
mod host_status;
mod ingredient;
mod known_ingredients;
mod target;
mod text;

pub use entities::{
    Author, Category, ImageRole, Ingredient, Recipe, RecipeImage, RecipeRating, Step, StepKind,
    Tag,
};
pub use host_status::HostWorkerStatus;
pub use ingredient::{
    conversion_rate, parse_ingredient_line, parse_quantity, sanitize, Measurement,
    ParsedIngredientLine,
};
pub use known_ingredients::{IngredientKnowledge, IngredientNameCache};
pub use target::{
    CrawlTarget, PageKind, ParserVersion, ProcessingStatus, TargetId, TargetUrlError,
};
pub use text::{parse_iso_duration_minutes, parse_servings, sentence_case};
