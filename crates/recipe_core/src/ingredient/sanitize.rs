/// Unicode characters that have a reasonable ASCII spelling in an
/// ingredient line. Vulgar fractions get a leading space so that `1½`
/// reads as the mixed number `1 1/2`.
const REPLACEMENTS: &[(char, &str)] = &[
    ('½', " 1/2"),
    ('⅓', " 1/3"),
    ('⅔', " 2/3"),
    ('¼', " 1/4"),
    ('¾', " 3/4"),
    ('⅕', " 1/5"),
    ('⅛', " 1/8"),
    ('⅜', " 3/8"),
    ('⅝', " 5/8"),
    ('⅞', " 7/8"),
    ('⁄', "/"),
    ('–', "-"),
    ('—', "-"),
    ('‐', "-"),
    ('\t', " "),
    ('\\', "/"),
    (';', ","),
    ('\u{a0}', " "),
];

fn is_approved(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | ',' | '(' | ')' | ':' | '-' | ' ' | '.')
}

/// Reduces a raw ingredient line to the approved character set with single
/// spaces between words.
pub fn sanitize(raw: &str) -> String {
    let mut mapped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if let Some((_, replacement)) = REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            mapped.push_str(replacement);
        } else if c.is_whitespace() {
            mapped.push(' ');
        } else if is_approved(c) {
            mapped.push(c);
        }
    }
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn maps_unicode_fractions_and_dashes() {
        assert_eq!(sanitize("1½ cups flour"), "1 1/2 cups flour");
        assert_eq!(sanitize("2–3 cloves garlic"), "2-3 cloves garlic");
    }

    #[test]
    fn drops_unapproved_characters_and_collapses_whitespace() {
        assert_eq!(
            sanitize("  1 cup\tsugar; sifted*  \"fine\" "),
            "1 cup sugar, sifted fine"
        );
    }
}
