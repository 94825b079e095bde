//! Title search over posts
//!
//! The same index is written to `search.json` for the search page, which
//! applies the same matching rule in the browser.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::content::Post;
use crate::helpers::{date_formal, prune};

/// One searchable post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
}

/// In-memory index of post titles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    /// Build the index in post order
    pub fn build(posts: &[Post], excerpt_length: usize) -> Self {
        let entries = posts
            .iter()
            .map(|p| SearchEntry {
                slug: p.slug.clone(),
                title: p.title.clone(),
                excerpt: prune(p.description_or_excerpt(), excerpt_length),
                date: date_formal(&p.date),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    /// Entries whose title contains every whitespace-separated term
    ///
    /// Matching is case-insensitive. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&SearchEntry> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|entry| {
                let title = entry.title.to_lowercase();
                terms.iter().all(|term| title.contains(term.as_str()))
            })
            .collect()
    }

    /// Write the index as JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Seoul;

    fn index() -> SearchIndex {
        let posts: Vec<Post> = [
            ("/react-hooks-1", "React Hooks 입문 1"),
            ("/react-hooks-2", "React Hooks 입문 2"),
            ("/django-tip", "Django 배포 팁"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (slug, title))| {
            let mut p = Post::new(
                slug.to_string(),
                title.to_string(),
                Seoul.with_ymd_and_hms(2020, 1, 1 + i as u32, 0, 0, 0).unwrap(),
            );
            p.excerpt = "본문 ".repeat(100);
            p
        })
        .collect();
        SearchIndex::build(&posts, 20)
    }

    fn titles<'a>(results: &[&'a SearchEntry]) -> Vec<&'a str> {
        results.iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn test_case_insensitive_substring() {
        let index = index();
        assert_eq!(
            titles(&index.search("REACT")),
            vec!["React Hooks 입문 1", "React Hooks 입문 2"]
        );
        assert_eq!(titles(&index.search("배포")), vec!["Django 배포 팁"]);
    }

    #[test]
    fn test_all_terms_must_match() {
        let index = index();
        assert_eq!(titles(&index.search("hooks 2")), vec!["React Hooks 입문 2"]);
        assert!(index.search("react django").is_empty());
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let index = index();
        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
    }

    #[test]
    fn test_entries_are_pruned_and_serialized() {
        let index = index();
        let entry = &index.entries()[2];
        assert_eq!(entry.date, "2020-01-03");
        assert!(entry.excerpt.chars().count() <= 21);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        index.write(&path).unwrap();
        let parsed: Vec<SearchEntry> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].slug, "/react-hooks-1");
    }
}
