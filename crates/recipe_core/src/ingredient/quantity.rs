use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

static RANGE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*-\s*|\s+to\s+").expect("valid range regex"));

/// Sums every whitespace-separated piece of a quantity (`1 1/4` -> `1.25`).
/// A range (`2-3`, `2 to 3`) resolves to its low end. Anything unparseable,
/// or too large to represent, yields the default quantity of one.
pub fn parse_quantity(text: &str) -> Decimal {
    let text = RANGE_SEPARATOR.split(text).next().unwrap_or_default();
    let mut total = Decimal::ZERO;
    let mut pieces = 0;
    for piece in text.split_whitespace() {
        match parse_piece(piece).and_then(|value| total.checked_add(value)) {
            Some(sum) => total = sum,
            None => return Decimal::ONE,
        }
        pieces += 1;
    }
    if pieces == 0 {
        Decimal::ONE
    } else {
        total
    }
}

fn parse_piece(piece: &str) -> Option<Decimal> {
    if let Some((numerator, denominator)) = piece.split_once('/') {
        let numerator = Decimal::from_str(numerator).ok()?;
        let denominator = Decimal::from_str(denominator).ok()?;
        return numerator.checked_div(denominator);
    }
    Decimal::from_str(piece).ok()
}
