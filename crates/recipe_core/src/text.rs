use std::sync::LazyLock;

use regex::Regex;

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<low>\d+)\s*(?:to|or|-)\s*(?P<high>\d+)").expect("valid servings regex")
});

static COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<count>\d+)").expect("valid servings regex"));

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^P(?:(?P<days>\d+)D)?(?:T(?:(?P<hours>\d+)H)?(?:(?P<minutes>\d+)M)?(?:(?P<seconds>\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("valid duration regex")
});

/// Servings from yield text: a literal count (`4`, `Serves 4`) or a range
/// (`4 to 6`, `4 or 6`, `4-6`) averaged and rounded up.
pub fn parse_servings(text: &str) -> Option<u32> {
    if let Some(caps) = RANGE.captures(text) {
        let low: u32 = caps["low"].parse().ok()?;
        let high: u32 = caps["high"].parse().ok()?;
        let average = (u64::from(low) + u64::from(high)).div_ceil(2);
        return u32::try_from(average).ok();
    }
    COUNT.captures(text)?["count"].parse().ok()
}

/// `"MAIN course"` -> `"Main course"`.
pub fn sentence_case(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whole minutes in an ISO-8601 duration such as `PT1H30M`. `None` when no
/// component is present or the total does not fit in a `u32`.
pub fn parse_iso_duration_minutes(text: &str) -> Option<u32> {
    let caps = ISO_DURATION.captures(text.trim())?;
    if ["days", "hours", "minutes", "seconds"]
        .iter()
        .all(|name| caps.name(name).is_none())
    {
        return None;
    }
    // `as` saturates, so absurd components overflow below instead of wrapping.
    let part = |name: &str| -> u32 {
        caps.name(name)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(|v| v as u32)
            .unwrap_or(0)
    };
    part("days")
        .checked_mul(24 * 60)?
        .checked_add(part("hours").checked_mul(60)?)?
        .checked_add(part("minutes"))?
        .checked_add(part("seconds") / 60)
}
