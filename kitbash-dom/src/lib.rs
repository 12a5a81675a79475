//! # Kitbash DOM
//!
//! Tolerant markup and style handling for Kitbash render surfaces.
//!
//! ## Features
//! - Forgiving markup parsing into an arena node tree (recovery instead of
//!   rejection; resource guards are the only hard errors)
//! - Stylesheet parsing with container scoping and documented global leaks
//!   (`@keyframes`, `@font-face`)
//! - A selector subset (tag / `#id` / `.class` / compounds / descendants /
//!   groups) for script queries
//! - Serialization back to HTML text with escaping
//!
//! ## Example
//! ```ignore
//! use kitbash_dom::{ParseLimits, Surface};
//!
//! let surface = Surface::build(
//!     r#"<button class="btn">Go</button>"#,
//!     ".btn { color: red }",
//!     "t1",
//!     ParseLimits::default(),
//! )?;
//! assert_eq!(surface.count(".btn")?, 1);
//! let html = surface.to_html();
//! ```

pub mod error;
pub mod html;
pub mod parser;
pub mod select;
pub mod style;
pub mod surface;
pub mod tree;

// --- Core types ---
pub use error::{DomError, DomResult};
pub use parser::ParseLimits;
pub use select::SelectorList;
pub use style::Stylesheet;
pub use surface::Surface;
pub use tree::{Node, NodeId, NodeKind, Outline, Tree};

pub use html::{escape_html, render_subtree};

/// Parse markup into a fresh tree rooted at a plain container element.
pub fn parse_markup(markup: &str) -> DomResult<Tree> {
    parse_markup_with_limits(markup, ParseLimits::default())
}

/// Parse markup with explicit resource guards.
pub fn parse_markup_with_limits(markup: &str, limits: ParseLimits) -> DomResult<Tree> {
    let mut tree = Tree::new("div");
    let root = tree.root();
    parser::parse_into(&mut tree, root, markup, &limits)?;
    Ok(tree)
}

/// Parse style text into a stylesheet. Tolerant; never fails.
pub fn parse_style(css: &str) -> Stylesheet {
    Stylesheet::parse(css)
}
