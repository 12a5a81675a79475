//! Arena-backed node tree for render surfaces.
//!
//! Snippet markup has no schema, so nodes are open element/text pairs rather
//! than a closed component set. Ids are arena indices; nodes detached by an
//! edit simply become unreachable and die with the tree.

use serde::Serialize;

/// Handle to a node inside one [`Tree`]. Only valid for the tree that
/// created it; operations given a foreign or stale id are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element {
        tag: String,
        /// Attribute order is preserved as authored.
        attrs: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
}

/// Structural dump of a subtree, independent of arena indices. Used for
/// structural comparison in tests and machine-readable output in tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outline {
    pub tag: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Outline>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Create a tree whose root is an element with the given tag.
    pub fn new(root_tag: &str) -> Self {
        let root = Node {
            kind: NodeKind::Element {
                tag: root_tag.to_string(),
                attrs: Vec::new(),
                children: Vec::new(),
            },
            parent: None,
        };
        Tree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total nodes ever created, including detached ones. Parse budgets are
    /// checked against this so edits cannot grow the arena without bound.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.push(NodeKind::Text(text))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, parent: None });
        id
    }

    /// Attach `child` as the last child of `parent`. No-op if either id is
    /// stale or `parent` is a text node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if self.node(child).is_none() {
            return;
        }
        let ok = match self.node_mut(parent) {
            Some(Node {
                kind: NodeKind::Element { children, .. },
                ..
            }) => {
                children.push(child);
                true
            }
            _ => false,
        };
        if ok {
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(parent);
            }
        }
    }

    /// Drop all children of `id`, leaving them unreachable.
    pub fn clear_children(&mut self, id: NodeId) {
        let old = match self.node_mut(id) {
            Some(Node {
                kind: NodeKind::Element { children, .. },
                ..
            }) => std::mem::take(children),
            _ => return,
        };
        for child in old {
            if let Some(node) = self.node_mut(child) {
                node.parent = None;
            }
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.node(id)?.kind {
            NodeKind::Element { ref tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(Node {
                kind: NodeKind::Element { children, .. },
                ..
            }) => children,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.node(id)?.kind {
            NodeKind::Element { ref attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(Node {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = self.node_mut(id)
        {
            if let Some(slot) = attrs.iter_mut().find(|(n, _)| n == name) {
                slot.1 = value.to_string();
            } else {
                attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class")
            .map(str::split_whitespace)
            .into_iter()
            .flatten()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if class.is_empty() || self.has_class(id, class) {
            return;
        }
        let mut list: Vec<&str> = self.classes(id).collect();
        list.push(class);
        let joined = list.join(" ");
        self.set_attr(id, "class", &joined);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let joined = self
            .classes(id)
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", &joined);
    }

    /// Returns whether the class is present after the toggle.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            true
        }
    }

    /// Merge inline declarations into the `style` attribute. Later values
    /// win per property; unknown text is kept verbatim, matching how a
    /// style attribute behaves.
    pub fn merge_style(&mut self, id: NodeId, decls: &str) {
        let mut merged = crate::style::parse_inline_decls(self.attr(id, "style").unwrap_or(""));
        for (prop, value) in crate::style::parse_inline_decls(decls) {
            if let Some(slot) = merged.iter_mut().find(|(p, _)| *p == prop) {
                slot.1 = value;
            } else {
                merged.push((prop, value));
            }
        }
        let rendered = merged
            .iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(id, "style", &rendered);
    }

    /// Concatenated text of all text descendants, document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.node(current) {
                Some(Node {
                    kind: NodeKind::Text(text),
                    ..
                }) => out.push_str(text),
                Some(Node {
                    kind: NodeKind::Element { children, .. },
                    ..
                }) => {
                    for child in children.iter().rev() {
                        stack.push(*child);
                    }
                }
                None => {}
            }
        }
        out
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if !matches!(
            self.node(id),
            Some(Node {
                kind: NodeKind::Element { .. },
                ..
            })
        ) {
            return;
        }
        self.clear_children(id);
        let child = self.create_text(text.to_string());
        self.append(id, child);
    }

    /// Preorder walk of the subtree rooted at `id`, including `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.node(current).is_none() {
                continue;
            }
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Structural dump of the subtree at `id`. Adjacent text nodes collapse
    /// into the `text` field of a synthetic `#text` outline.
    pub fn outline(&self, id: NodeId) -> Option<Outline> {
        match &self.node(id)?.kind {
            NodeKind::Text(text) => Some(Outline {
                tag: "#text".to_string(),
                attrs: Vec::new(),
                children: Vec::new(),
                text: text.clone(),
            }),
            NodeKind::Element {
                tag,
                attrs,
                children,
            } => Some(Outline {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: children
                    .iter()
                    .filter_map(|c| self.outline(*c))
                    .collect(),
                text: String::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_list_editing() {
        let mut tree = Tree::new("div");
        let root = tree.root();
        tree.add_class(root, "active");
        tree.add_class(root, "primary");
        tree.add_class(root, "active");
        assert_eq!(tree.attr(root, "class"), Some("active primary"));

        tree.remove_class(root, "active");
        assert_eq!(tree.attr(root, "class"), Some("primary"));

        assert!(tree.toggle_class(root, "open"));
        assert!(!tree.toggle_class(root, "open"));
        assert_eq!(tree.attr(root, "class"), Some("primary"));
    }

    #[test]
    fn test_style_merge_keeps_order_and_overrides() {
        let mut tree = Tree::new("div");
        let root = tree.root();
        tree.merge_style(root, "color: red; padding: 4px");
        tree.merge_style(root, "color: blue");
        assert_eq!(tree.attr(root, "style"), Some("color: blue; padding: 4px"));
    }

    #[test]
    fn test_set_text_replaces_children() {
        let mut tree = Tree::new("div");
        let root = tree.root();
        let span = tree.create_element("span");
        tree.append(root, span);
        tree.set_text(root, "hello");
        assert_eq!(tree.children(root).len(), 1);
        assert_eq!(tree.text_content(root), "hello");
        // The detached span no longer reaches the root.
        assert!(tree.node(span).is_some());
        assert!(tree.node(span).and_then(|n| n.parent).is_none());
    }

    #[test]
    fn test_stale_ids_are_ignored() {
        let mut tree = Tree::new("div");
        let stale = NodeId(99);
        tree.set_attr(stale, "id", "x");
        tree.add_class(stale, "x");
        assert_eq!(tree.text_content(stale), "");
        assert!(tree.outline(stale).is_none());
    }
}
