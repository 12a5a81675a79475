//! The render surface: an owned container tree built from one markup/style
//! pair, with the stylesheet scoped to the container token. The caller owns
//! the surface and destroys it by dropping it; every mutating operation
//! resolves its selector fresh, so edits compose with earlier edits.

use crate::error::DomResult;
use crate::html::render_subtree;
use crate::parser::{parse_into, ParseLimits};
use crate::select::SelectorList;
use crate::style::Stylesheet;
use crate::tree::{NodeId, Outline, Tree};

const ROOT_TAG: &str = "div";

#[derive(Debug, Clone)]
pub struct Surface {
    tree: Tree,
    token: String,
    stylesheet: Stylesheet,
    limits: ParseLimits,
}

impl Surface {
    /// Build a surface from a markup/style pair. Style parsing is tolerant
    /// and cannot fail; markup parsing fails only on the resource guards.
    pub fn build(markup: &str, style: &str, token: &str, limits: ParseLimits) -> DomResult<Self> {
        let mut tree = Tree::new(ROOT_TAG);
        let root = tree.root();
        tree.set_attr(root, "data-kb", token);
        parse_into(&mut tree, root, markup, &limits)?;
        let stylesheet = Stylesheet::parse(style).scoped(token);
        Ok(Surface {
            tree,
            token: token.to_string(),
            stylesheet,
            limits,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// All nodes matching `selector`, document order, container excluded.
    pub fn query(&self, selector: &str) -> DomResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(list.query(&self.tree, self.tree.root()))
    }

    pub fn count(&self, selector: &str) -> DomResult<usize> {
        Ok(self.query(selector)?.len())
    }

    /// Replace the text of every match; returns the match count.
    pub fn set_text(&mut self, selector: &str, text: &str) -> DomResult<usize> {
        let targets = self.query(selector)?;
        for id in &targets {
            self.tree.set_text(*id, text);
        }
        Ok(targets.len())
    }

    /// Text content of the first match.
    pub fn get_text(&self, selector: &str) -> DomResult<Option<String>> {
        let list = SelectorList::parse(selector)?;
        Ok(list
            .query_first(&self.tree, self.tree.root())
            .map(|id| self.tree.text_content(id)))
    }

    /// Re-parse `markup` in place of every match's children.
    pub fn set_markup(&mut self, selector: &str, markup: &str) -> DomResult<usize> {
        let targets = self.query(selector)?;
        for id in &targets {
            self.tree.clear_children(*id);
            parse_into(&mut self.tree, *id, markup, &self.limits)?;
        }
        Ok(targets.len())
    }

    pub fn set_attr(&mut self, selector: &str, name: &str, value: &str) -> DomResult<usize> {
        let targets = self.query(selector)?;
        for id in &targets {
            self.tree.set_attr(*id, name, value);
        }
        Ok(targets.len())
    }

    pub fn get_attr(&self, selector: &str, name: &str) -> DomResult<Option<String>> {
        let list = SelectorList::parse(selector)?;
        Ok(list
            .query_first(&self.tree, self.tree.root())
            .and_then(|id| self.tree.attr(id, name).map(str::to_string)))
    }

    pub fn add_class(&mut self, selector: &str, class: &str) -> DomResult<usize> {
        let targets = self.query(selector)?;
        for id in &targets {
            self.tree.add_class(*id, class);
        }
        Ok(targets.len())
    }

    pub fn remove_class(&mut self, selector: &str, class: &str) -> DomResult<usize> {
        let targets = self.query(selector)?;
        for id in &targets {
            self.tree.remove_class(*id, class);
        }
        Ok(targets.len())
    }

    /// Toggle on every match; returns whether the first match ended up with
    /// the class (host checkbox semantics).
    pub fn toggle_class(&mut self, selector: &str, class: &str) -> DomResult<bool> {
        let targets = self.query(selector)?;
        let mut first_state = false;
        for (i, id) in targets.iter().enumerate() {
            let state = self.tree.toggle_class(*id, class);
            if i == 0 {
                first_state = state;
            }
        }
        Ok(first_state)
    }

    pub fn has_class(&self, selector: &str, class: &str) -> DomResult<bool> {
        let list = SelectorList::parse(selector)?;
        Ok(list
            .query_first(&self.tree, self.tree.root())
            .map(|id| self.tree.has_class(id, class))
            .unwrap_or(false))
    }

    pub fn set_style(&mut self, selector: &str, decls: &str) -> DomResult<usize> {
        let targets = self.query(selector)?;
        for id in &targets {
            self.tree.merge_style(*id, decls);
        }
        Ok(targets.len())
    }

    /// Serialize the container: children, then the scoped `<style>` element.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(ROOT_TAG);
        out.push_str(" data-kb=\"");
        out.push_str(&self.token);
        out.push_str("\">");
        for child in self.tree.children(self.tree.root()) {
            out.push_str(&render_subtree(&self.tree, *child));
        }
        if !self.stylesheet.is_empty() {
            out.push_str("<style>\n");
            out.push_str(&self.stylesheet.render());
            out.push_str("</style>");
        }
        out.push_str("</");
        out.push_str(ROOT_TAG);
        out.push('>');
        out
    }

    /// Structural dump of the container subtree.
    pub fn outline(&self) -> Option<Outline> {
        self.tree.outline(self.tree.root())
    }
}
