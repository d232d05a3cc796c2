//! Repositories over the on-disk layout
//!
//! Each repository reads and writes one level of the hierarchy. None of
//! them lock; [`crate::Store`] wraps mutations in a document lease.

pub mod blocks;
pub mod chapters;
pub mod documents;
pub mod locator;

pub use blocks::{BlockRepository, LocatedBlock};
pub use chapters::ChapterRepository;
pub use documents::DocumentRepository;
pub use locator::{BlockKey, Location, Locator, Scope};

/// Filesystem-safe slug
///
/// Lowercases, collapses every run of characters outside `[a-z0-9_-]` into
/// a single `-`, trims `-` from both ends and keeps at most `max_len`
/// characters. May return an empty string.
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut in_gap = false;

    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
            slug.push(c);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }

    slug.trim_matches('-').chars().take(max_len).collect()
}

/// Next `<prefix>-NNN` ID: one past the highest existing number
///
/// Only IDs of exactly the form `<prefix>-<digits>` count, so gaps left by
/// deletions are never refilled.
pub fn next_sequential_id<'a>(prefix: &str, ids: impl IntoIterator<Item = &'a str>) -> String {
    let max = ids
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix)?.strip_prefix('-'))
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|digits| digits.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}-{:03}", prefix, max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_sequential_id() {
        assert_eq!(next_sequential_id("md", []), "md-001");
        assert_eq!(next_sequential_id("md", ["md-001", "md-004", "hd-009"]), "md-005");
        assert_eq!(next_sequential_id("md", ["md-x", "md-", "md-12a", "mdx-3"]), "md-001");
        assert_eq!(next_sequential_id("ch", ["ch-999"]), "ch-1000");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Report", 50), "my-report");
        assert_eq!(slugify("  Hello,   World!  ", 50), "hello-world");
        assert_eq!(slugify("snake_case-ok", 50), "snake_case-ok");
        assert_eq!(slugify("Café Menü", 50), "caf-men");
        assert_eq!(slugify("!!!", 50), "");
        assert_eq!(slugify(&"a".repeat(80), 50).len(), 50);
        assert_eq!(slugify("Getting Started With Rust Today", 10), "getting-st");
    }
}
