use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::Html;

/// Key every structured-data block must carry to be kept.
pub const STRUCTURED_DATA_MARKER: &str = "@context";
const STRUCTURED_DATA_TYPE: &str = "application/ld+json";

/// Elements dropped wholesale from the cleaned document.
const NOISE_TAGS: &[&str] = &[
    "template", "svg", "noscript", "iframe", "form", "style", "ins", "object", "embed",
];

/// Class or id fragments that mark inserted ad containers.
const AD_MARKERS: &[&str] = &[
    "adsbygoogle",
    "advertisement",
    "ad-slot",
    "ad-container",
    "ad-wrapper",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedPage {
    /// Document with noise removed; used for selector based backfill.
    pub cleaned_html: String,
    /// Raw structured-data JSON texts in document order.
    pub json_blocks: Vec<String>,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> ExtractedPage;
}

/// Isolates embedded JSON-LD and strips everything a normalizer never needs:
/// comments, scripts, templates, inline SVG, noscript, iframes, forms, style
/// blocks and ad slots. A page without structured data is not an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredDataExtractor;

impl Extractor for StructuredDataExtractor {
    fn extract(&self, html: &str) -> ExtractedPage {
        let document = Html::parse_document(html);
        let mut ctx = CleaningContext::default();
        for child in document.tree.root().children() {
            visit_node(child, &mut ctx);
        }
        ExtractedPage {
            cleaned_html: ctx.out.trim().to_string(),
            json_blocks: ctx.blocks,
        }
    }
}

#[derive(Default)]
struct CleaningContext {
    out: String,
    blocks: Vec<String>,
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut CleaningContext) {
    match node.value() {
        Node::Text(text) => push_collapsed(&mut ctx.out, text),
        Node::Element(element) => visit_element(node, element, ctx),
        Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
        _ => {
            for child in node.children() {
                visit_node(child, ctx);
            }
        }
    }
}

fn visit_element(node: NodeRef<'_, Node>, element: &Element, ctx: &mut CleaningContext) {
    let tag = element.name().to_ascii_lowercase();
    if tag == "script" {
        if is_structured_data(element) {
            let body: String = node
                .children()
                .filter_map(|child| child.value().as_text().map(|t| String::from(&**t)))
                .collect();
            if body.contains(STRUCTURED_DATA_MARKER) {
                ctx.blocks.push(clean_json_text(&body));
            }
        }
        return;
    }
    if NOISE_TAGS.contains(&tag.as_str()) || is_ad_slot(element) {
        return;
    }

    ctx.out.push('<');
    ctx.out.push_str(&tag);
    for (name, value) in element.attrs() {
        ctx.out.push(' ');
        ctx.out.push_str(name);
        ctx.out.push_str("=\"");
        push_escaped(&mut ctx.out, value, true);
        ctx.out.push('"');
    }
    ctx.out.push('>');

    if VOID_TAGS.contains(&tag.as_str()) {
        return;
    }
    for child in node.children() {
        visit_node(child, ctx);
    }
    ctx.out.push_str("</");
    ctx.out.push_str(&tag);
    ctx.out.push('>');
}

/// An explicitly empty `type` or the ld+json type. A script without any
/// `type` attribute is ordinary JavaScript.
fn is_structured_data(element: &Element) -> bool {
    element
        .attr("type")
        .map(str::trim)
        .is_some_and(|kind| kind.is_empty() || kind.eq_ignore_ascii_case(STRUCTURED_DATA_TYPE))
}

fn is_ad_slot(element: &Element) -> bool {
    let matches = |value: &str| {
        let lower = value.to_ascii_lowercase();
        AD_MARKERS.iter().any(|marker| lower.contains(marker))
    };
    element.attr("class").is_some_and(matches) || element.id().is_some_and(matches)
}

/// Control characters (usually literal newlines inside JSON strings) make
/// otherwise valid blocks unparseable, and some sites still wrap the block in
/// comment or CDATA guards.
fn clean_json_text(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let mut text = replaced.trim();
    for prefix in ["<!--", "//<![CDATA[", "<![CDATA["] {
        text = text.strip_prefix(prefix).unwrap_or(text).trim();
    }
    for suffix in ["-->", "//]]>", "]]>"] {
        text = text.strip_suffix(suffix).unwrap_or(text).trim();
    }
    text.to_string()
}

/// Runs of two or more whitespace characters become one space, or one
/// newline when the run contained a line break.
fn push_collapsed(out: &mut String, text: &str) {
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_whitespace(out, &run);
        run.clear();
        push_escaped_char(out, c, false);
    }
    flush_whitespace(out, &run);
}

fn flush_whitespace(out: &mut String, run: &str) {
    match run.chars().count() {
        0 => {}
        1 => out.push_str(run),
        _ if run.contains('\n') => out.push('\n'),
        _ => out.push(' '),
    }
}

fn push_escaped(out: &mut String, text: &str, in_attribute: bool) {
    for c in text.chars() {
        push_escaped_char(out, c, in_attribute);
    }
}

fn push_escaped_char(out: &mut String, c: char, in_attribute: bool) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' if !in_attribute => out.push_str("&lt;"),
        '>' if !in_attribute => out.push_str("&gt;"),
        '"' if in_attribute => out.push_str("&quot;"),
        '\u{a0}' => out.push_str("&nbsp;"),
        _ => out.push(c),
    }
}
