//! Typed structured-data objects and the grouper that produces them.
mod grouper;
mod types;
mod values;

pub use grouper::{group_objects, PageObjects, SchemaError};
pub use types::{
    ImageObjectData, ItemListData, OrganizationData, PersonData, ProfilePageData, RecipeData,
    SchemaObject, SchemaType, WebPageData, WebSiteData,
};
pub use values::{AggregateRating, AuthorRef, InstructionStep, ListItemRef};
