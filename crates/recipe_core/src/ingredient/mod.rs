//! Free-text ingredient line parsing.
mod measurement;
mod parser;
mod quantity;
mod sanitize;

pub use measurement::{conversion_rate, Measurement};
pub use parser::{parse_ingredient_line, ParsedIngredientLine};
pub use quantity::parse_quantity;
pub use sanitize::sanitize;
