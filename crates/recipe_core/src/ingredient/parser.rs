use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::measurement::{conversion_rate, Measurement, TOKENS};
use super::quantity::parse_quantity;
use super::sanitize::sanitize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIngredientLine {
    pub name: String,
    pub quantity: Decimal,
    pub measurement: Measurement,
    pub notes: Option<String>,
}

fn unit_alternation() -> String {
    TOKENS
        .iter()
        .map(|(spelling, _)| *spelling)
        .collect::<Vec<_>>()
        .join("|")
}

static AND_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\band\b").expect("valid ingredient regex"));

static PLUS_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bplus\b").expect("valid ingredient regex"));

/// A number (range, mixed fraction, fraction or decimal) optionally followed
/// by a measurement token, e.g. `1 1/4 cups`, `2-3 cloves` or `14-ounce`.
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    let number = r"\d+(?:\.\d+)?\s+\d+/\d+|\d+/\d+|\d+(?:\.\d+)?";
    let pattern = format!(
        r"(?i)\b(?P<qty>(?:{number})(?:\s*-\s*|\s+to\s+)(?:{number})|{number})(?:\s*-?\s*(?P<unit>{})\b\.?)?",
        unit_alternation()
    );
    Regex::new(&pattern).expect("valid ingredient regex")
});

/// A measurement with no number in front of it, e.g. `pinch of salt`.
static LEADING_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)^\s*(?:a\s+|an\s+)?(?P<unit>{})\b\.?", unit_alternation());
    Regex::new(&pattern).expect("valid ingredient regex")
});

#[derive(Debug, Clone, Copy)]
struct RawQuantity {
    quantity: Decimal,
    measurement: Measurement,
}

/// Parses one free-text ingredient line into one or more structured lines.
///
/// The line is split on `and` only when every piece carries its own quantity
/// and measurement; each piece is then split on `plus` and its quantities are
/// summed in the first quantity's measurement. Quantities that cannot be
/// converted become separate lines.
pub fn parse_ingredient_line(raw: &str) -> Vec<ParsedIngredientLine> {
    let line = sanitize(raw);
    if line.is_empty() {
        return Vec::new();
    }

    let segments: Vec<&str> = AND_SPLIT.split(&line).collect();
    let independent = segments.len() >= 2 && segments.iter().all(|s| has_quantity_and_unit(s));
    if independent {
        let mut lines: Vec<ParsedIngredientLine> =
            segments.into_iter().flat_map(parse_segment).collect();
        share_names(&mut lines);
        lines
    } else {
        parse_segment(&line)
    }
}

/// `1 cup and 2 tablespoons sugar`: a segment with only a quantity takes the
/// name of the next named segment, or of the previous one when none follows.
fn share_names(lines: &mut [ParsedIngredientLine]) {
    let mut following: Option<String> = None;
    for line in lines.iter_mut().rev() {
        if line.name.is_empty() {
            if let Some(name) = &following {
                line.name = name.clone();
            }
        } else {
            following = Some(line.name.clone());
        }
    }
    let mut preceding: Option<String> = None;
    for line in lines.iter_mut() {
        if line.name.is_empty() {
            if let Some(name) = &preceding {
                line.name = name.clone();
            }
        } else {
            preceding = Some(line.name.clone());
        }
    }
}

fn has_quantity_and_unit(segment: &str) -> bool {
    QUANTITY
        .captures_iter(segment)
        .any(|caps| caps.name("unit").is_some())
}

fn parse_segment(segment: &str) -> Vec<ParsedIngredientLine> {
    let (body, parentheticals) = extract_parentheticals(segment);
    let (raws, spans) = find_raw_quantities(&body);
    let text = remove_spans(&body, spans);
    let (name, notes) = split_name_and_notes(&text, &parentheticals);

    combine(&raws)
        .into_iter()
        .map(|(measurement, quantity)| ParsedIngredientLine {
            name: name.clone(),
            quantity: quantity.normalize(),
            measurement,
            notes: notes.clone(),
        })
        .collect()
}

/// Forward scan for `(...)` groups. Nesting is not understood, and an `(`
/// without a later `)` is left in place.
fn extract_parentheticals(segment: &str) -> (String, Vec<String>) {
    let mut body = String::with_capacity(segment.len());
    let mut groups = Vec::new();
    let mut rest = segment;
    loop {
        let Some(open) = rest.find('(') else {
            body.push_str(rest);
            break;
        };
        let Some(close_offset) = rest[open..].find(')') else {
            body.push_str(rest);
            break;
        };
        let close = open + close_offset;
        body.push_str(&rest[..open]);
        body.push(' ');
        let inner = rest[open + 1..close].trim();
        if !inner.is_empty() {
            groups.push(inner.to_string());
        }
        rest = &rest[close + 1..];
    }
    (body, groups)
}

fn find_raw_quantities(body: &str) -> (Vec<RawQuantity>, Vec<Range<usize>>) {
    let separators: Vec<Range<usize>> = PLUS_SPLIT.find_iter(body).map(|m| m.range()).collect();

    let mut parts = Vec::with_capacity(separators.len() + 1);
    let mut start = 0;
    for separator in &separators {
        parts.push(start..separator.start);
        start = separator.end;
    }
    parts.push(start..body.len());

    let mut raws = Vec::new();
    let mut spans = Vec::new();
    for (index, part) in parts.into_iter().enumerate() {
        let slice = &body[part.clone()];
        let found = if let Some(caps) = QUANTITY.captures(slice) {
            let whole = caps.get(0).map(|m| m.range());
            let quantity = caps
                .name("qty")
                .map(|m| parse_quantity(m.as_str()))
                .unwrap_or(Decimal::ONE);
            let measurement = caps
                .name("unit")
                .and_then(|m| Measurement::from_token(m.as_str()))
                .unwrap_or(Measurement::Unit);
            whole.map(|range| (range, RawQuantity { quantity, measurement }))
        } else if let Some(caps) = LEADING_UNIT.captures(slice) {
            let measurement = caps
                .name("unit")
                .and_then(|m| Measurement::from_token(m.as_str()))
                .unwrap_or(Measurement::Unit);
            caps.get(0).map(|m| {
                (
                    m.range(),
                    RawQuantity {
                        quantity: Decimal::ONE,
                        measurement,
                    },
                )
            })
        } else {
            None
        };

        if let Some((range, raw)) = found {
            spans.push(part.start + range.start..part.start + range.end);
            if index > 0 {
                spans.push(separators[index - 1].clone());
            }
            raws.push(raw);
        }
    }

    if raws.is_empty() {
        raws.push(RawQuantity {
            quantity: Decimal::ONE,
            measurement: Measurement::Unit,
        });
    }
    (raws, spans)
}

fn remove_spans(body: &str, mut spans: Vec<Range<usize>>) -> String {
    spans.sort_by_key(|span| span.start);
    let mut kept = String::with_capacity(body.len());
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor {
            continue;
        }
        kept.push_str(&body[cursor..span.start]);
        kept.push(' ');
        cursor = span.end;
    }
    kept.push_str(&body[cursor..]);
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_name_and_notes(text: &str, parentheticals: &[String]) -> (String, Option<String>) {
    let text = text.trim_start_matches(|c: char| matches!(c, ',' | '-' | ':' | ' '));
    let text = text
        .strip_prefix("of ")
        .or_else(|| text.strip_prefix("Of "))
        .unwrap_or(text);

    let mut pieces = text.split(',');
    let name = pieces
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches(|c: char| matches!(c, '-' | ':'))
        .trim()
        .to_string();

    let trailing: Vec<&str> = pieces.map(str::trim).filter(|p| !p.is_empty()).collect();
    let mut notes = trailing.join(", ");
    if !parentheticals.is_empty() {
        if !notes.is_empty() {
            notes.push(' ');
        }
        notes.push('(');
        notes.push_str(&parentheticals.join(", "));
        notes.push(')');
    }

    let notes = if notes.is_empty() { None } else { Some(notes) };
    (name, notes)
}

/// Folds raw quantities into groups keyed by the first measurement each one
/// converts to. The first group is the reference measurement. An addend that
/// would overflow the group total is dropped.
fn combine(raws: &[RawQuantity]) -> Vec<(Measurement, Decimal)> {
    let mut groups: Vec<(Measurement, Decimal)> = Vec::new();
    for raw in raws {
        let target = groups.iter_mut().find_map(|(measurement, total)| {
            conversion_rate(raw.measurement, *measurement).map(|rate| (total, rate))
        });
        match target {
            Some((total, rate)) => {
                if let Some(sum) = raw
                    .quantity
                    .checked_mul(rate)
                    .and_then(|converted| total.checked_add(converted))
                {
                    *total = sum;
                }
            }
            None => groups.push((raw.measurement, raw.quantity)),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parentheticals_are_extracted_in_order() {
        let (body, groups) = extract_parentheticals("1 can (14 oz) tomatoes (drained)");
        assert_eq!(groups, vec!["14 oz".to_string(), "drained".to_string()]);
        assert!(!body.contains('('));
    }

    #[test]
    fn unbalanced_parenthesis_is_left_alone() {
        let (body, groups) = extract_parentheticals("2 cups stock (homemade");
        assert!(groups.is_empty());
        assert_eq!(body, "2 cups stock (homemade");
    }

    #[test]
    fn overflowing_addend_keeps_running_total() {
        let raws = [
            RawQuantity {
                quantity: Decimal::ONE,
                measurement: Measurement::Teaspoon,
            },
            RawQuantity {
                quantity: Decimal::MAX,
                measurement: Measurement::Cup,
            },
        ];
        assert_eq!(combine(&raws), vec![(Measurement::Teaspoon, Decimal::ONE)]);
    }

    #[test]
    fn overlapping_spans_are_skipped() {
        assert_eq!(remove_spans("abc def ghi", vec![4..7, 0..3, 1..2]), "ghi");
    }
}
