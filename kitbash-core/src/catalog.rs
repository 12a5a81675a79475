//! Catalog queries over snippet and category lists: browse filtering,
//! per-category counts, and the slug rules category ids follow.

use std::sync::OnceLock;

use regex::Regex;

use crate::snippet::{Category, Snippet};

static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();

/// Snippets in `category` whose title or description contains `query`,
/// case-insensitively. A blank query matches everything in the category;
/// snippets without a description match on title only. Input order is
/// preserved.
pub fn filter<'a>(snippets: &'a [Snippet], category: &str, query: &str) -> Vec<&'a Snippet> {
    let needle = query.trim().to_lowercase();
    snippets
        .iter()
        .filter(|s| s.category == category)
        .filter(|s| {
            if needle.is_empty() {
                return true;
            }
            s.title.to_lowercase().contains(&needle)
                || s.description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .collect()
}

/// Each category paired with the number of snippets currently in it.
/// Computed fresh from the snippet list on every call.
pub fn category_counts<'a>(
    categories: &'a [Category],
    snippets: &[Snippet],
) -> Vec<(&'a Category, usize)> {
    categories
        .iter()
        .map(|c| (c, snippets.iter().filter(|s| s.category == c.id).count()))
        .collect()
}

/// Derive a category id from a display name: lowercase, whitespace runs
/// become single hyphens, anything else non-alphanumeric is dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        }
    }
    slug.trim_matches('-').to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    let slug_regex = SLUG_REGEX.get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());
    slug_regex.is_match(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::{FragmentSet, SnippetDraft};

    fn snippet(title: &str, category: &str, description: Option<&str>) -> Snippet {
        SnippetDraft {
            title: title.to_string(),
            category: category.to_string(),
            description: description.map(str::to_string),
            fragments: FragmentSet::default(),
        }
        .into_snippet()
    }

    #[test]
    fn test_filter_is_scoped_to_category() {
        let snippets = vec![
            snippet("Primary Button", "buttons", None),
            snippet("Gradient Heading", "headings", None),
        ];
        let hits = filter(&snippets, "buttons", "");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Primary Button");
    }

    #[test]
    fn test_filter_matches_title_and_description_case_insensitively() {
        let snippets = vec![
            snippet("Primary Button", "buttons", Some("A gradient call to action")),
            snippet("Outline Button", "buttons", None),
        ];
        assert_eq!(filter(&snippets, "buttons", "PRIMARY").len(), 1);
        assert_eq!(filter(&snippets, "buttons", "gradient").len(), 1);
        assert_eq!(filter(&snippets, "buttons", "button").len(), 2);
        assert_eq!(filter(&snippets, "buttons", "  outline ").len(), 1);
        assert!(filter(&snippets, "buttons", "zzz").is_empty());
    }

    #[test]
    fn test_counts_track_the_snippet_list() {
        let categories = vec![
            Category {
                id: "buttons".to_string(),
                name: "Buttons".to_string(),
                icon: "mouse-pointer".to_string(),
                description: None,
            },
            Category {
                id: "forms".to_string(),
                name: "Forms".to_string(),
                icon: "file-text".to_string(),
                description: None,
            },
        ];
        let snippets = vec![
            snippet("A", "buttons", None),
            snippet("B", "buttons", None),
            snippet("C", "icons", None),
        ];
        let counts = category_counts(&categories, &snippets);
        assert_eq!(counts[0].1, 2);
        assert_eq!(counts[1].1, 0);
    }

    #[test]
    fn test_slugify_normalizes_names() {
        assert_eq!(slugify("Cool Buttons"), "cool-buttons");
        assert_eq!(slugify("  Spaced   Out  "), "spaced-out");
        assert_eq!(slugify("Cards & Tiles!"), "cards-tiles");
        assert_eq!(slugify("UPPER"), "upper");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("buttons"));
        assert!(is_valid_slug("cool-buttons-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("Upper"));
    }
}
