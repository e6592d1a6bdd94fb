use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measurement {
    /// Generic count used when no measurement token is recognised.
    Unit,
    Cup,
    Tablespoon,
    Teaspoon,
    Ounce,
    Pint,
    Quart,
    Pound,
    Gram,
    Piece,
    Slice,
    Clove,
    Bunch,
    Fillet,
    Inch,
    Can,
    Pinch,
}

/// Measurements that share a volume scale, expressed in teaspoons.
const VOLUME_IN_TEASPOONS: &[(Measurement, i64)] = &[
    (Measurement::Teaspoon, 1),
    (Measurement::Tablespoon, 3),
    (Measurement::Ounce, 6),
    (Measurement::Cup, 48),
    (Measurement::Pint, 96),
    (Measurement::Quart, 192),
];

/// Token spellings, longest first within a family so the regex alternation
/// prefers `tablespoons` over `tablespoon`.
pub(crate) const TOKENS: &[(&str, Measurement)] = &[
    ("tablespoons", Measurement::Tablespoon),
    ("tablespoon", Measurement::Tablespoon),
    ("tbsps", Measurement::Tablespoon),
    ("tbsp", Measurement::Tablespoon),
    ("tbs", Measurement::Tablespoon),
    ("teaspoons", Measurement::Teaspoon),
    ("teaspoon", Measurement::Teaspoon),
    ("tsps", Measurement::Teaspoon),
    ("tsp", Measurement::Teaspoon),
    ("cups", Measurement::Cup),
    ("cup", Measurement::Cup),
    ("ounces", Measurement::Ounce),
    ("ounce", Measurement::Ounce),
    ("oz", Measurement::Ounce),
    ("pints", Measurement::Pint),
    ("pint", Measurement::Pint),
    ("quarts", Measurement::Quart),
    ("quart", Measurement::Quart),
    ("pounds", Measurement::Pound),
    ("pound", Measurement::Pound),
    ("lbs", Measurement::Pound),
    ("lb", Measurement::Pound),
    ("grams", Measurement::Gram),
    ("gram", Measurement::Gram),
    ("pieces", Measurement::Piece),
    ("piece", Measurement::Piece),
    ("slices", Measurement::Slice),
    ("slice", Measurement::Slice),
    ("cloves", Measurement::Clove),
    ("clove", Measurement::Clove),
    ("bunches", Measurement::Bunch),
    ("bunch", Measurement::Bunch),
    ("fillets", Measurement::Fillet),
    ("fillet", Measurement::Fillet),
    ("inches", Measurement::Inch),
    ("inch", Measurement::Inch),
    ("cans", Measurement::Can),
    ("can", Measurement::Can),
    ("pinches", Measurement::Pinch),
    ("pinch", Measurement::Pinch),
];

impl Measurement {
    /// Resolves a token (any case, optional trailing period) to a measurement.
    pub fn from_token(token: &str) -> Option<Measurement> {
        let token = token.trim().trim_end_matches('.').to_ascii_lowercase();
        TOKENS
            .iter()
            .find(|(spelling, _)| *spelling == token)
            .map(|(_, measurement)| *measurement)
    }

    pub fn name(self) -> &'static str {
        match self {
            Measurement::Unit => "unit",
            Measurement::Cup => "cup",
            Measurement::Tablespoon => "tablespoon",
            Measurement::Teaspoon => "teaspoon",
            Measurement::Ounce => "ounce",
            Measurement::Pint => "pint",
            Measurement::Quart => "quart",
            Measurement::Pound => "pound",
            Measurement::Gram => "gram",
            Measurement::Piece => "piece",
            Measurement::Slice => "slice",
            Measurement::Clove => "clove",
            Measurement::Bunch => "bunch",
            Measurement::Fillet => "fillet",
            Measurement::Inch => "inch",
            Measurement::Can => "can",
            Measurement::Pinch => "pinch",
        }
    }

    fn teaspoons(self) -> Option<Decimal> {
        VOLUME_IN_TEASPOONS
            .iter()
            .find(|(m, _)| *m == self)
            .map(|(_, tsp)| Decimal::from(*tsp))
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How many `to` make up one `from`, or `None` when there is no conversion
/// path. Count-like measurements only convert to themselves.
pub fn conversion_rate(from: Measurement, to: Measurement) -> Option<Decimal> {
    if from == to {
        return Some(Decimal::ONE);
    }
    let from_tsp = from.teaspoons()?;
    let to_tsp = to.teaspoons()?;
    from_tsp.checked_div(to_tsp)
}
