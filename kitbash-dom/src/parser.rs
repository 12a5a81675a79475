//! Tolerant markup parser. Snippet markup is authored by hand and previewed
//! live, so the parser recovers instead of rejecting: mismatched close tags
//! close the nearest matching ancestor, unknown constructs degrade to text,
//! unclosed elements are closed at end of input. The only hard failures are
//! the resource guards (nesting depth, node budget).

use crate::error::{DomError, DomResult};
use crate::html::decode_entities;
use crate::tree::{NodeId, Tree};

/// Elements that never take children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text until their close tag. Their text is
/// kept in the tree but never executed; the script executor is the only
/// path that runs code.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        ParseLimits {
            max_depth: 64,
            max_nodes: 4096,
        }
    }
}

/// Parse `markup` and append the resulting nodes under `parent`.
/// Depth is counted relative to `parent`; the node budget is checked
/// against the whole tree so repeated edits cannot grow it without bound.
pub fn parse_into(
    tree: &mut Tree,
    parent: NodeId,
    markup: &str,
    limits: &ParseLimits,
) -> DomResult<()> {
    Parser {
        tree,
        base: parent,
        stack: Vec::new(),
        limits,
    }
    .run(markup)
}

struct Parser<'a> {
    tree: &'a mut Tree,
    base: NodeId,
    stack: Vec<(NodeId, String)>,
    limits: &'a ParseLimits,
}

impl Parser<'_> {
    fn run(mut self, input: &str) -> DomResult<()> {
        let mut i = 0;
        let len = input.len();
        while i < len {
            match input[i..].find('<') {
                None => {
                    self.text(&input[i..])?;
                    break;
                }
                Some(0) => {
                    i = self.markup(input, i)?;
                }
                Some(n) => {
                    self.text(&input[i..i + n])?;
                    i += n;
                }
            }
        }
        Ok(())
    }

    fn current_parent(&self) -> NodeId {
        self.stack.last().map(|(id, _)| *id).unwrap_or(self.base)
    }

    fn ensure_budget(&self) -> DomResult<()> {
        if self.tree.node_count() >= self.limits.max_nodes {
            return Err(DomError::NodeBudgetExceeded {
                max_nodes: self.limits.max_nodes,
            });
        }
        Ok(())
    }

    fn text(&mut self, raw: &str) -> DomResult<()> {
        if raw.is_empty() {
            return Ok(());
        }
        self.ensure_budget()?;
        let parent = self.current_parent();
        let node = self.tree.create_text(decode_entities(raw));
        self.tree.append(parent, node);
        Ok(())
    }

    /// Handle the construct starting at the `<` at byte `i`; returns the
    /// index just past it.
    fn markup(&mut self, input: &str, i: usize) -> DomResult<usize> {
        let rest = &input[i..];
        if let Some(stripped) = rest.strip_prefix("<!--") {
            return Ok(match stripped.find("-->") {
                Some(n) => i + 4 + n + 3,
                None => input.len(), // unterminated comment swallows the rest
            });
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            return Ok(match rest.find('>') {
                Some(n) => i + n + 1,
                None => input.len(),
            });
        }
        if let Some(after) = rest.strip_prefix("</") {
            let name: String = after
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect();
            let consumed = match rest.find('>') {
                Some(n) => i + n + 1,
                None => input.len(),
            };
            if !name.is_empty() {
                self.close(&name.to_ascii_lowercase());
            }
            return Ok(consumed);
        }
        if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            return self.open_tag(input, i);
        }
        // A lone '<' is literal text.
        self.text("<")?;
        Ok(i + 1)
    }

    fn close(&mut self, name: &str) {
        if let Some(pos) = self.stack.iter().rposition(|(_, tag)| tag == name) {
            self.stack.truncate(pos);
        }
        // No matching open element: the close tag is ignored.
    }

    fn open_tag(&mut self, input: &str, start: usize) -> DomResult<usize> {
        let bytes = input.as_bytes();
        let len = input.len();
        let mut j = start + 1;

        let name_start = j;
        while j < len && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'-') {
            j += 1;
        }
        let tag = input[name_start..j].to_ascii_lowercase();

        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;
        let mut complete = false;

        while j < len {
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= len {
                break;
            }
            if bytes[j] == b'>' {
                j += 1;
                complete = true;
                break;
            }
            if input[j..].starts_with("/>") {
                j += 2;
                self_closing = true;
                complete = true;
                break;
            }

            let attr_start = j;
            while j < len && !bytes[j].is_ascii_whitespace() && !matches!(bytes[j], b'=' | b'>') {
                j += 1;
            }
            if j == attr_start {
                j += 1; // junk byte inside the tag, skip it
                continue;
            }
            let mut attr_name = input[attr_start..j].to_ascii_lowercase();

            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let mut value = String::new();
            if j < len && bytes[j] == b'=' {
                j += 1;
                while j < len && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j < len && (bytes[j] == b'"' || bytes[j] == b'\'') {
                    let quote = bytes[j];
                    j += 1;
                    let value_start = j;
                    while j < len && bytes[j] != quote {
                        j += 1;
                    }
                    value = decode_entities(&input[value_start..j]);
                    if j < len {
                        j += 1; // closing quote
                    }
                } else {
                    let value_start = j;
                    while j < len && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    let mut bare = &input[value_start..j];
                    // `<img src=x/>`: the slash belongs to the tag close.
                    if bare.ends_with('/') && j < len && bytes[j] == b'>' {
                        bare = &bare[..bare.len() - 1];
                        self_closing = true;
                    }
                    value = decode_entities(bare);
                }
            }
            // A trailing solo '/' is tag syntax, not an attribute.
            if attr_name == "/" {
                self_closing = true;
                continue;
            }
            attr_name = attr_name.trim_end_matches('/').to_string();
            if attr_name.is_empty() {
                continue;
            }
            if !attrs.iter().any(|(n, _)| *n == attr_name) {
                attrs.push((attr_name, value)); // first occurrence wins
            }
        }

        if !complete {
            // End of input inside the tag: the partial tag is dropped.
            return Ok(len);
        }

        self.ensure_budget()?;
        let parent = self.current_parent();
        let node = self.tree.create_element(&tag);
        for (name, value) in &attrs {
            self.tree.set_attr(node, name, value);
        }
        self.tree.append(parent, node);

        if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
            return Ok(j);
        }

        if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            return self.raw_text(input, j, node, &tag);
        }

        self.stack.push((node, tag));
        if self.stack.len() > self.limits.max_depth {
            return Err(DomError::MaxNestingDepthExceeded {
                max_depth: self.limits.max_depth,
            });
        }
        Ok(j)
    }

    /// Consume raw text up to `</tag`, attach it verbatim, skip the close tag.
    fn raw_text(
        &mut self,
        input: &str,
        from: usize,
        node: NodeId,
        tag: &str,
    ) -> DomResult<usize> {
        let lower = input[from..].to_ascii_lowercase();
        let close = format!("</{}", tag);
        let (text_end, mut next) = match lower.find(&close) {
            Some(n) => (from + n, from + n + close.len()),
            None => (input.len(), input.len()),
        };
        let text = &input[from..text_end];
        if !text.is_empty() {
            self.ensure_budget()?;
            let child = self.tree.create_text(text.to_string());
            self.tree.append(node, child);
        }
        if next < input.len() {
            next = match input[next..].find('>') {
                Some(n) => next + n + 1,
                None => input.len(),
            };
        }
        Ok(next)
    }
}
