//! HTML text escaping, entity decoding and subtree serialization.

use crate::tree::{NodeId, NodeKind, Tree};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Escape text for safe inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode the basic named entities plus decimal and hex numeric references.
/// Anything unrecognized stays literal, matching the parser's tolerance.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail[1..].find(';') {
            Some(end) if end > 0 && end <= 10 => {
                let body = &tail[1..1 + end];
                match decode_entity(body) {
                    Some(decoded) => {
                        out.push(decoded);
                        rest = &tail[end + 2..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(body: &str) -> Option<char> {
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = body.strip_prefix('#')?;
            let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                digits.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Serialize the subtree rooted at `id` to HTML text.
pub fn render_subtree(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    render_node(tree, id, &mut out);
    out
}

fn render_node(tree: &Tree, id: NodeId, out: &mut String) {
    let Some(node) = tree.node(id) else {
        return;
    };
    match &node.kind {
        NodeKind::Text(text) => out.push_str(&escape_html(text)),
        NodeKind::Element { tag, attrs, children } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_html(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                // Raw text content is emitted verbatim; escaping would
                // corrupt embedded style text.
                for child in children {
                    if let Some(crate::tree::Node {
                        kind: NodeKind::Text(text),
                        ..
                    }) = tree.node(*child)
                    {
                        out.push_str(text);
                    }
                }
            } else {
                for child in children {
                    render_node(tree, *child, out);
                }
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trips_through_decode() {
        let original = "a < b & \"c\" > 'd'";
        assert_eq!(decode_entities(&escape_html(original)), original);
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_entities("&#65;&#x42;&#x1F600;"), "AB\u{1F600}");
        // Unknown or bare ampersands stay literal.
        assert_eq!(decode_entities("a&b &unknown; &#; &"), "a&b &unknown; &#; &");
    }

    #[test]
    fn test_serializes_elements_and_voids() {
        let mut tree = Tree::new("div");
        let root = tree.root();
        let img = tree.create_element("img");
        tree.set_attr(img, "src", "a.png");
        tree.append(root, img);
        let p = tree.create_element("p");
        tree.append(root, p);
        tree.set_text(p, "x < y");
        assert_eq!(
            render_subtree(&tree, root),
            "<div><img src=\"a.png\"><p>x &lt; y</p></div>"
        );
    }
}
