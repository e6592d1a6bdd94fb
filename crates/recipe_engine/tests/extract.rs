use pretty_assertions::assert_eq;
use recipe_engine::{decode_html, Extractor, StructuredDataExtractor};

const RECIPE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Soup</title>
  <!-- analytics -->
  <style>body { color: red; }</style>
  <script src="/app.js"></script>
  <script type="application/ld+json">
  {"@context": "https://schema.org", "@type": "Recipe",
   "name": "Tomato
   Soup"}
  </script>
  <script type="application/ld+json">{"tracking": true}</script>
</head>
<body>
  <div class="adsbygoogle">Buy now</div>
  <svg><path d="M0"></path></svg>
  <noscript><img src="/pixel.gif"></noscript>
  <form><input name="q"></form>
  <h1>Tomato    Soup</h1>
  <p class="intro">Warm   &amp; bright.</p>
  <script type="">{"@context": "https://schema.org", "@type": "WebSite", "name": "Example"}</script>
  <script>window.schemaHints = {"@context": "https://schema.org"};</script>
</body>
</html>"#;

#[test]
fn decode_respects_charset_header() {
    let bytes = b"caf\xe9"; // iso-8859-1
    let decoded = decode_html(bytes, Some("text/html; charset=ISO-8859-1")).unwrap();
    assert_eq!(decoded.html, "caf\u{e9}");
    assert!(
        decoded.encoding_label.eq_ignore_ascii_case("ISO-8859-1")
            || decoded.encoding_label.eq_ignore_ascii_case("windows-1252")
    );
}

#[test]
fn decode_handles_utf8_bom() {
    let bytes = b"\xEF\xBB\xBFhello";
    let decoded = decode_html(bytes, Some("text/html")).unwrap();
    assert_eq!(decoded.html, "hello");
    assert_eq!(decoded.encoding_label, "UTF-8");
}

#[test]
fn structured_blocks_are_collected_in_document_order() {
    let page = StructuredDataExtractor.extract(RECIPE_PAGE);
    assert_eq!(page.json_blocks.len(), 2);
    assert!(page.json_blocks[0].contains("\"Recipe\""));
    assert!(page.json_blocks[0].contains("Tomato    Soup"));
    assert!(!page.json_blocks[0].contains('\n'));
    assert!(page.json_blocks[1].contains("\"WebSite\""));
    for block in &page.json_blocks {
        serde_json::from_str::<serde_json::Value>(block).expect("cleaned block parses");
    }
}

#[test]
fn noise_is_removed_from_cleaned_html() {
    let page = StructuredDataExtractor.extract(RECIPE_PAGE);
    let html = &page.cleaned_html;
    for noise in ["analytics", "color: red", "app.js", "Buy now", "<svg", "pixel.gif", "<form", "tracking", "schemaHints"] {
        assert!(!html.contains(noise), "{noise} survived in {html}");
    }
    assert!(html.contains("<h1>Tomato Soup</h1>"));
    assert!(html.contains("<p class=\"intro\">Warm &amp; bright.</p>"));
}

#[test]
fn untyped_script_is_not_structured_data() {
    let page = StructuredDataExtractor.extract(RECIPE_PAGE);
    assert!(page.json_blocks.iter().all(|block| !block.contains("schemaHints")));
}

#[test]
fn page_without_structured_data_is_not_an_error() {
    let page = StructuredDataExtractor.extract("<html><body><a href=\"/next\">Next</a></body></html>");
    assert!(page.json_blocks.is_empty());
    assert!(page.cleaned_html.contains("<a href=\"/next\">Next</a>"));
}
