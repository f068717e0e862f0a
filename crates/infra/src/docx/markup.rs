//! WordprocessingML string helpers.
//!
//! The document XML is handled as text: placeholders only need the run
//! structure around them cleaned up, and tables only need rows cut and
//! re-assembled.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// `{` + markup + `{`/`%`, and `%`/`}` + markup + `}`.
static SPLIT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?:<[^>]*>)+([{%])").expect("valid regex"));
static SPLIT_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([%}])(?:<[^>]*>)+\}").expect("valid regex"));
/// A whole tag, possibly spanning several runs.
static TAG_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").expect("valid regex"));
/// Run boundary inside a tag: close a text node, open the next one.
static RUN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)</w:t>.*?<w:t(?:\s[^>]*)?>").expect("valid regex"));
static TEXT_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("valid regex"));

/// Merge tags that Word split across several runs back into one text node.
pub fn repair_split_tags(xml: &str) -> String {
    let xml = SPLIT_OPEN.replace_all(xml, "{$1");
    let xml = SPLIT_CLOSE.replace_all(&xml, "$1}");
    TAG_SPAN
        .replace_all(&xml, |caps: &regex::Captures<'_>| {
            RUN_BREAK.replace_all(&caps[0], "").into_owned()
        })
        .into_owned()
}

/// Replace each element holding a `{%<marker> ... %}` tag with a bare
/// `{% ... %}` tag, e.g. `{%p if x %}` drops its whole paragraph.
pub fn collapse_scoped_tags(xml: &str, marker: &str, element: &str) -> String {
    let opener = format!("{{%{marker} ");
    let mut out = xml.to_string();
    let mut search_from = 0;

    while let Some(rel) = out[search_from..].find(&opener) {
        let tag_start = search_from + rel;
        let Some(tag_len) = out[tag_start..].find("%}") else {
            break;
        };
        let tag_end = tag_start + tag_len + 2;
        let statement = out[tag_start + opener.len()..tag_end - 2].trim().to_string();

        let Some(el_start) = rfind_open(&out[..tag_start], element) else {
            search_from = tag_end;
            continue;
        };
        let close = format!("</{element}>");
        let Some(close_rel) = out[tag_end..].find(&close) else {
            search_from = tag_end;
            continue;
        };
        let el_end = tag_end + close_rel + close.len();

        let replacement = format!("{{% {statement} %}}");
        out.replace_range(el_start..el_end, &replacement);
        search_from = el_start + replacement.len();
    }

    out
}

/// Byte ranges of every top-level `<tag>` element in `xml`.
pub fn elements(xml: &str, tag: &str) -> Vec<Range<usize>> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_open(xml, &open, pos) {
        match element_end(xml, start, &open, &close) {
            Some(end) => {
                found.push(start..end);
                pos = end;
            }
            None => break,
        }
    }
    found
}

/// The first `<tag>` element in `xml`, as text.
pub fn first_element<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    elements(xml, tag).into_iter().next().map(|r| &xml[r])
}

/// The opening tag (`<w:tr ...>`) of an element.
pub fn opening_tag(element: &str) -> &str {
    match element.find('>') {
        Some(end) => &element[..=end],
        None => element,
    }
}

/// Concatenated text of all `<w:t>` nodes, unescaped.
pub fn plain_text(xml: &str) -> String {
    TEXT_NODE
        .captures_iter(xml)
        .map(|caps| unescape(&caps[1]))
        .collect::<Vec<_>>()
        .join("")
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Find `<tag` followed by a delimiter (so `<w:p` does not match `<w:pPr`).
fn find_open(xml: &str, open: &str, from: usize) -> Option<usize> {
    let mut from = from;
    while let Some(rel) = xml.get(from..)?.find(open) {
        let at = from + rel;
        match xml.as_bytes().get(at + open.len()) {
            Some(b' ') | Some(b'>') | Some(b'/') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {
                return Some(at);
            }
            _ => from = at + open.len(),
        }
    }
    None
}

fn rfind_open(xml: &str, tag: &str) -> Option<usize> {
    let open = format!("<{tag}");
    let mut end = xml.len();
    while let Some(at) = xml[..end].rfind(&open) {
        match xml.as_bytes().get(at + open.len()) {
            Some(b' ') | Some(b'>') | Some(b'\t') | Some(b'\n') | Some(b'\r') => return Some(at),
            _ => end = at,
        }
    }
    None
}

fn element_end(xml: &str, start: usize, open: &str, close: &str) -> Option<usize> {
    let head_end = start + xml[start..].find('>')?;
    if xml.as_bytes()[head_end - 1] == b'/' {
        return Some(head_end + 1);
    }

    let mut depth = 1usize;
    let mut cursor = head_end + 1;
    loop {
        let next_close = cursor + xml[cursor..].find(close)?;
        match find_open(xml, open, cursor) {
            Some(next_open) if next_open < next_close => {
                let nested_head = next_open + xml[next_open..].find('>')?;
                if xml.as_bytes()[nested_head - 1] != b'/' {
                    depth += 1;
                }
                cursor = nested_head + 1;
            }
            _ => {
                depth -= 1;
                cursor = next_close + close.len();
                if depth == 0 {
                    return Some(cursor);
                }
            }
        }
    }
}
