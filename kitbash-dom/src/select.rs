//! Selector subset used by script queries: tag, `#id`, `.class`, compounds
//! of those, descendant combinator, and comma groups. Enough to address
//! snippet markup; anything fancier is not part of the contract.

use crate::error::{DomError, DomResult};
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Chain {
    /// Ancestor-to-target compound sequence (descendant combinator).
    parts: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    chains: Vec<Chain>,
}

impl SelectorList {
    pub fn parse(input: &str) -> DomResult<Self> {
        let mut chains = Vec::new();
        for group in input.split(',') {
            let group = group.trim();
            if group.is_empty() {
                return Err(invalid(input, "empty selector group"));
            }
            let mut parts = Vec::new();
            for word in group.split_whitespace() {
                parts.push(parse_compound(word, input)?);
            }
            chains.push(Chain { parts });
        }
        if chains.is_empty() {
            return Err(invalid(input, "empty selector"));
        }
        Ok(SelectorList { chains })
    }

    /// All matching nodes under `scope` in document order. The scope node
    /// itself is never a match, as with host querySelectorAll semantics.
    pub fn query(&self, tree: &Tree, scope: NodeId) -> Vec<NodeId> {
        self.query_limit(tree, scope, usize::MAX)
    }

    /// First match under `scope`, if any.
    pub fn query_first(&self, tree: &Tree, scope: NodeId) -> Option<NodeId> {
        self.query_limit(tree, scope, 1).into_iter().next()
    }

    fn query_limit(&self, tree: &Tree, scope: NodeId, limit: usize) -> Vec<NodeId> {
        let mut out = Vec::new();
        for id in tree.descendants(scope) {
            if id == scope {
                continue;
            }
            if self.matches(tree, id) {
                out.push(id);
                if out.len() >= limit {
                    break;
                }
            }
        }
        out
    }

    fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        self.chains.iter().any(|c| chain_matches(tree, id, c))
    }
}

fn chain_matches(tree: &Tree, id: NodeId, chain: &Chain) -> bool {
    let Some((target, ancestors)) = chain.parts.split_last() else {
        return false;
    };
    if !compound_matches(tree, id, target) {
        return false;
    }
    // Right-to-left: each earlier compound must match some strict ancestor.
    let mut cursor = tree.node(id).and_then(|n| n.parent);
    for needed in ancestors.iter().rev() {
        loop {
            let Some(current) = cursor else {
                return false;
            };
            cursor = tree.node(current).and_then(|n| n.parent);
            if compound_matches(tree, current, needed) {
                break;
            }
        }
    }
    true
}

fn compound_matches(tree: &Tree, id: NodeId, compound: &Compound) -> bool {
    let Some(tag) = tree.tag(id) else {
        return false; // text nodes never match
    };
    if let Some(wanted) = &compound.tag {
        if wanted != "*" && wanted != tag {
            return false;
        }
    }
    if let Some(wanted) = &compound.id {
        if tree.attr(id, "id") != Some(wanted.as_str()) {
            return false;
        }
    }
    compound.classes.iter().all(|c| tree.has_class(id, c))
}

fn parse_compound(word: &str, whole: &str) -> DomResult<Compound> {
    let mut compound = Compound::default();
    let mut rest = word;

    let tag_end = rest
        .find(|c| c == '#' || c == '.')
        .unwrap_or(rest.len());
    if tag_end > 0 {
        let tag = &rest[..tag_end];
        if tag != "*" && !is_name(tag) {
            return Err(invalid(whole, "bad tag name"));
        }
        compound.tag = Some(tag.to_ascii_lowercase());
        rest = &rest[tag_end..];
    }

    while !rest.is_empty() {
        let marker = rest.as_bytes()[0];
        let body = &rest[1..];
        let end = body
            .find(|c| c == '#' || c == '.')
            .unwrap_or(body.len());
        let name = &body[..end];
        if name.is_empty() || !is_name(name) {
            return Err(invalid(whole, "bad id or class name"));
        }
        match marker {
            b'#' => {
                if compound.id.is_some() {
                    return Err(invalid(whole, "multiple ids in one compound"));
                }
                compound.id = Some(name.to_string());
            }
            b'.' => compound.classes.push(name.to_string()),
            _ => return Err(invalid(whole, "unsupported selector syntax")),
        }
        rest = &body[end..];
    }

    if compound.tag.is_none() && compound.id.is_none() && compound.classes.is_empty() {
        return Err(invalid(whole, "empty compound"));
    }
    Ok(compound)
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn invalid(selector: &str, reason: &str) -> DomError {
    DomError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        let mut tree = Tree::new("div");
        let root = tree.root();
        let button = tree.create_element("button");
        tree.set_attr(button, "class", "btn btn-primary");
        tree.set_attr(button, "id", "go");
        tree.append(root, button);
        let span = tree.create_element("span");
        tree.set_attr(span, "class", "label");
        tree.append(button, span);
        tree.set_text(span, "Click");
        tree
    }

    #[test]
    fn test_tag_id_class_queries() {
        let tree = sample();
        let root = tree.root();

        let by_tag = SelectorList::parse("button").unwrap();
        assert_eq!(by_tag.query(&tree, root).len(), 1);

        let by_id = SelectorList::parse("#go").unwrap();
        assert!(by_id.query_first(&tree, root).is_some());

        let by_class = SelectorList::parse(".btn-primary").unwrap();
        assert_eq!(by_class.query(&tree, root).len(), 1);

        let compound = SelectorList::parse("button.btn#go").unwrap();
        assert_eq!(compound.query(&tree, root).len(), 1);

        let missing = SelectorList::parse(".nope").unwrap();
        assert!(missing.query(&tree, root).is_empty());
    }

    #[test]
    fn test_descendant_and_groups() {
        let tree = sample();
        let root = tree.root();

        let nested = SelectorList::parse("button .label").unwrap();
        assert_eq!(nested.query(&tree, root).len(), 1);

        let inverted = SelectorList::parse(".label button").unwrap();
        assert!(inverted.query(&tree, root).is_empty());

        let group = SelectorList::parse("span, #go").unwrap();
        assert_eq!(group.query(&tree, root).len(), 2);
    }

    #[test]
    fn test_scope_is_excluded() {
        let tree = sample();
        let root = tree.root();
        let all = SelectorList::parse("div").unwrap();
        // The scope element itself is a div but never a match.
        assert!(all.query(&tree, root).is_empty());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            SelectorList::parse(""),
            Err(DomError::InvalidSelector { .. })
        ));
        assert!(matches!(
            SelectorList::parse("a > b"),
            Err(DomError::InvalidSelector { .. })
        ));
        assert!(matches!(
            SelectorList::parse("#one#two"),
            Err(DomError::InvalidSelector { .. })
        ));
    }
}
