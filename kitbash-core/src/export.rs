//! Clipboard-oriented export of snippet fragments, individually or as a
//! single annotated bundle.

use std::fmt;

use crate::snippet::Snippet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Markup,
    Style,
    Script,
}

impl FragmentKind {
    pub fn parse(name: &str) -> Option<FragmentKind> {
        match name {
            "markup" => Some(FragmentKind::Markup),
            "style" => Some(FragmentKind::Style),
            "script" => Some(FragmentKind::Script),
            _ => None,
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FragmentKind::Markup => "markup",
            FragmentKind::Style => "style",
            FragmentKind::Script => "script",
        };
        f.write_str(name)
    }
}

/// One fragment of a snippet, verbatim.
pub fn fragment(snippet: &Snippet, kind: FragmentKind) -> &str {
    match kind {
        FragmentKind::Markup => &snippet.fragments.markup,
        FragmentKind::Style => &snippet.fragments.style,
        FragmentKind::Script => &snippet.fragments.script,
    }
}

/// All three fragments concatenated under fixed section banners, headed by
/// the snippet title. The banner text and ordering are stable; callers may
/// split a bundle back apart on them.
pub fn bundle(snippet: &Snippet) -> String {
    format!(
        "<!-- {} -->\n<!-- Markup -->\n{}\n\n/* Style */\n{}\n\n-- Script\n{}",
        snippet.title, snippet.fragments.markup, snippet.fragments.style, snippet.fragments.script
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::{FragmentSet, SnippetDraft};
    use pretty_assertions::assert_eq;

    fn sample() -> Snippet {
        SnippetDraft {
            title: "Primary Button".to_string(),
            category: "buttons".to_string(),
            description: None,
            fragments: FragmentSet::new(
                "<button class=\"btn\">Go</button>",
                ".btn { color: white; }",
                "print('ready')",
            ),
        }
        .into_snippet()
    }

    #[test]
    fn test_fragment_returns_verbatim_text() {
        let snippet = sample();
        assert_eq!(fragment(&snippet, FragmentKind::Markup), "<button class=\"btn\">Go</button>");
        assert_eq!(fragment(&snippet, FragmentKind::Style), ".btn { color: white; }");
        assert_eq!(fragment(&snippet, FragmentKind::Script), "print('ready')");
    }

    #[test]
    fn test_bundle_uses_fixed_banners() {
        let snippet = sample();
        let expected = "<!-- Primary Button -->\n\
                        <!-- Markup -->\n\
                        <button class=\"btn\">Go</button>\n\
                        \n\
                        /* Style */\n\
                        .btn { color: white; }\n\
                        \n\
                        -- Script\n\
                        print('ready')";
        assert_eq!(bundle(&snippet), expected);
    }

    #[test]
    fn test_fragment_kind_parses_cli_names() {
        assert_eq!(FragmentKind::parse("markup"), Some(FragmentKind::Markup));
        assert_eq!(FragmentKind::parse("style"), Some(FragmentKind::Style));
        assert_eq!(FragmentKind::parse("script"), Some(FragmentKind::Script));
        assert_eq!(FragmentKind::parse("css"), None);
    }
}
