//! Tolerant stylesheet handling: parse authored CSS into rules, scope every
//! selector to a container token, render back to CSS text.
//!
//! Parsing never fails; rules the scanner cannot shape are dropped. Scoping
//! prefixes selectors with the container's attribute selector. Known leaks,
//! kept deliberately: `@keyframes` names and `@font-face` declarations are
//! global in CSS and pass through verbatim.

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selectors: Vec<String>,
    pub declarations: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Rule(Rule),
    /// `@media` / `@supports`: the condition plus scoped inner items.
    Conditional { prelude: String, items: Vec<Item> },
    /// Verbatim passthrough (`@keyframes`, `@font-face`).
    Raw(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub items: Vec<Item>,
}

impl Stylesheet {
    /// Parse style text. Malformed constructs are skipped, never fatal.
    pub fn parse(css: &str) -> Self {
        let clean = strip_comments(css);
        Stylesheet {
            items: parse_items(&clean),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Scope every selector to the container carrying `data-kb="token"`.
    /// `:root`, `html` and `body` selectors are rewritten to the container
    /// itself rather than prefixed.
    pub fn scoped(&self, token: &str) -> Stylesheet {
        let prefix = format!("[data-kb=\"{}\"]", token);
        Stylesheet {
            items: self.items.iter().map(|i| scope_item(i, &prefix)).collect(),
        }
    }

    /// Render to CSS text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            render_item(item, 0, &mut out);
        }
        out
    }
}

fn scope_item(item: &Item, prefix: &str) -> Item {
    match item {
        Item::Rule(rule) => Item::Rule(Rule {
            selectors: rule
                .selectors
                .iter()
                .map(|s| scope_selector(s, prefix))
                .collect(),
            declarations: rule.declarations.clone(),
        }),
        Item::Conditional { prelude, items } => Item::Conditional {
            prelude: prelude.clone(),
            items: items.iter().map(|i| scope_item(i, prefix)).collect(),
        },
        Item::Raw(text) => Item::Raw(text.clone()),
    }
}

fn scope_selector(selector: &str, prefix: &str) -> String {
    let trimmed = selector.trim();
    let (head, tail) = match trimmed.split_once(char::is_whitespace) {
        Some((h, t)) => (h, Some(t.trim_start())),
        None => (trimmed, None),
    };
    let head_is_root = matches!(
        head.to_ascii_lowercase().as_str(),
        ":root" | "html" | "body"
    );
    match (head_is_root, tail) {
        (true, Some(rest)) => format!("{} {}", prefix, rest),
        (true, None) => prefix.to_string(),
        (false, _) => format!("{} {}", prefix, trimmed),
    }
}

fn render_item(item: &Item, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match item {
        Item::Rule(rule) => {
            out.push_str(&pad);
            out.push_str(&rule.selectors.join(", "));
            out.push_str(" {");
            for (prop, value) in &rule.declarations {
                out.push(' ');
                out.push_str(prop);
                out.push_str(": ");
                out.push_str(value);
                out.push(';');
            }
            out.push_str(" }\n");
        }
        Item::Conditional { prelude, items } => {
            out.push_str(&pad);
            out.push_str(prelude);
            out.push_str(" {\n");
            for inner in items {
                render_item(inner, depth + 1, out);
            }
            out.push_str(&pad);
            out.push_str("}\n");
        }
        Item::Raw(text) => {
            out.push_str(&pad);
            out.push_str(text.trim());
            out.push('\n');
        }
    }
}

/// Split `prop: value; prop: value` text into trimmed pairs, quote- and
/// paren-aware so `url(data:a;b)` and quoted strings survive. Entries
/// without a colon are dropped.
pub fn parse_inline_decls(input: &str) -> Vec<(String, String)> {
    let clean = strip_comments(input);
    let mut out = Vec::new();
    for piece in split_outside(&clean, ';') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if let Some((prop, value)) = piece.split_once(':') {
            let prop = prop.trim();
            let value = value.trim();
            if !prop.is_empty() && !value.is_empty() {
                out.push((prop.to_string(), value.to_string()));
            }
        }
    }
    out
}

/// Remove `/* … */` comments outside quoted strings. An unterminated
/// comment swallows the rest of the input.
fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut quote: Option<char> = None;
    let mut chars = rest.char_indices();
    loop {
        let Some((idx, ch)) = chars.next() else {
            out.push_str(rest);
            return out;
        };
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '/' if rest[idx..].starts_with("/*") => {
                    out.push_str(&rest[..idx]);
                    match rest[idx + 2..].find("*/") {
                        Some(n) => {
                            rest = &rest[idx + 2 + n + 2..];
                            chars = rest.char_indices();
                        }
                        None => return out,
                    }
                }
                _ => {}
            },
        }
    }
}

/// Split on `sep` occurrences that sit outside quotes and parentheses.
fn split_outside(input: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in input.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                c if c == sep && depth == 0 => {
                    pieces.push(&input[start..idx]);
                    start = idx + ch.len_utf8();
                }
                _ => {}
            },
        }
    }
    pieces.push(&input[start..]);
    pieces
}

fn parse_items(css: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut i = 0;
    let len = css.len();

    while i < len {
        i = skip_whitespace(css, i);
        if i >= len {
            break;
        }

        if css[i..].starts_with('@') {
            let (item, next) = parse_at_rule(css, i);
            if let Some(item) = item {
                items.push(item);
            }
            i = next;
            continue;
        }

        // Qualified rule: selector text up to '{', block to the matching '}'.
        let Some(open_rel) = find_outside(&css[i..], '{') else {
            break; // trailing garbage with no block
        };
        let open = i + open_rel;
        let raw_selector = &css[i..open];
        // Stray declarations before a selector ("color: red; .ok") are
        // dropped; the selector is whatever follows the last ';' or '}'.
        let tail = raw_selector
            .rfind(|c| c == ';' || c == '}')
            .map(|n| n + 1)
            .unwrap_or(0);
        let selector_text = &raw_selector[tail..];
        let Some(close) = find_block_end(css, open) else {
            break; // unterminated block swallows the rest
        };
        let body = &css[open + 1..close];
        let selectors: Vec<String> = split_outside(selector_text, ',')
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !selectors.is_empty() {
            items.push(Item::Rule(Rule {
                selectors,
                declarations: parse_inline_decls(body),
            }));
        }
        i = close + 1;
    }

    items
}

fn parse_at_rule(css: &str, at: usize) -> (Option<Item>, usize) {
    let len = css.len();
    let name_end = css[at + 1..]
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .map(|n| at + 1 + n)
        .unwrap_or(len);
    let name = css[at + 1..name_end].to_ascii_lowercase();

    let open = find_outside(&css[at..], '{').map(|n| at + n);
    let semi = find_outside(&css[at..], ';').map(|n| at + n);

    // Statement at-rules (@import, @charset, …) end at ';' and are dropped:
    // no external fetches, and nothing else meaningful to scope.
    let block_open = match (open, semi) {
        (Some(o), Some(s)) if s < o => return (None, s + 1),
        (Some(o), _) => o,
        (None, Some(s)) => return (None, s + 1),
        (None, None) => return (None, len),
    };
    let Some(close) = find_block_end(css, block_open) else {
        return (None, len);
    };

    match name.as_str() {
        "media" | "supports" => {
            let prelude = format!("@{} {}", name, css[name_end..block_open].trim());
            let items = parse_items(&css[block_open + 1..close]);
            (
                Some(Item::Conditional {
                    prelude: prelude.trim_end().to_string(),
                    items,
                }),
                close + 1,
            )
        }
        "keyframes" | "-webkit-keyframes" | "font-face" => (
            Some(Item::Raw(css[at..=close].to_string())),
            close + 1,
        ),
        _ => (None, close + 1), // unknown block at-rules are dropped
    }
}

fn skip_whitespace(css: &str, mut i: usize) -> usize {
    let bytes = css.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// First `wanted` outside quotes and parentheses, relative to `input`.
fn find_outside(input: &str, wanted: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in input.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == wanted && depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Index of the `}` matching the `{` at `open`, quote-aware.
fn find_block_end(css: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in css[open..].char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_rules_and_declarations() {
        let sheet = Stylesheet::parse(".btn { color: red; padding: 4px }\n.btn:hover{color:blue}");
        assert_eq!(sheet.items.len(), 2);
        match &sheet.items[0] {
            Item::Rule(rule) => {
                assert_eq!(rule.selectors, vec![".btn".to_string()]);
                assert_eq!(rule.declarations[0], ("color".into(), "red".into()));
            }
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_malformed_rules() {
        let sheet = Stylesheet::parse("color: red;\n.ok { color: blue }\n.broken {");
        // Stray declarations and the unterminated block are dropped.
        assert_eq!(sheet.items.len(), 1);
        match &sheet.items[0] {
            Item::Rule(rule) => assert_eq!(rule.selectors, vec![".ok".to_string()]),
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_scoping_prefixes_and_rewrites_roots() {
        let sheet = Stylesheet::parse("body { margin: 0 } .btn, .tag { color: red }");
        let css = sheet.scoped("t1").render();
        assert!(css.contains("[data-kb=\"t1\"] { margin: 0; }"));
        assert!(css.contains("[data-kb=\"t1\"] .btn, [data-kb=\"t1\"] .tag { color: red; }"));
    }

    #[test]
    fn test_media_recurses_keyframes_pass_through() {
        let css = "@media (max-width: 600px) { .btn { display: none } }\n\
                   @keyframes spin { to { transform: rotate(360deg) } }\n\
                   @import url(x.css);";
        let scoped = Stylesheet::parse(css).scoped("t2").render();
        assert!(scoped.contains("@media (max-width: 600px) {"));
        assert!(scoped.contains("[data-kb=\"t2\"] .btn { display: none; }"));
        assert!(scoped.contains("@keyframes spin"));
        // Keyframe step selectors stay unprefixed.
        assert!(!scoped.contains("[data-kb=\"t2\"] to"));
        assert!(!scoped.contains("@import"));
    }

    #[test]
    fn test_declarations_with_nested_separators() {
        let decls = parse_inline_decls(
            "background: url(\"a;b.png\"); font: url(data:font/woff;base64,xx); color: red",
        );
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[2], ("color".into(), "red".into()));
    }

    #[test]
    fn test_comments_are_stripped() {
        let sheet = Stylesheet::parse("/* header */ .a { /* inline */ color: red }");
        assert_eq!(sheet.items.len(), 1);
        match &sheet.items[0] {
            Item::Rule(rule) => {
                assert_eq!(rule.declarations, vec![("color".into(), "red".into())]);
            }
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_comment_swallows_rest() {
        let sheet = Stylesheet::parse(".a { color: red } /* trailing .b { x: y }");
        assert_eq!(sheet.items.len(), 1);
    }
}
