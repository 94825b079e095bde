//! Post and Page models

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use super::markdown::Heading;

/// Reading speed used for `time_to_read`, in words per minute
pub const WORDS_PER_MINUTE: usize = 265;

/// A blog post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Slug with a leading slash (`/react-hooks-1`)
    pub slug: String,

    pub title: String,

    pub date: DateTime<Tz>,

    /// Description from front-matter, may be empty
    pub description: String,

    /// Tag slugs as written in front-matter
    pub tags: Vec<String>,

    /// Thumbnail path relative to the images directory
    pub thumbnail: Option<String>,

    pub draft: bool,

    /// Raw markdown body
    pub raw: String,

    /// Rendered HTML body
    pub html: String,

    /// Plain-text excerpt
    pub excerpt: String,

    /// Headings for the table of contents
    pub headings: Vec<Heading>,

    /// Estimated minutes to read
    pub time_to_read: usize,

    /// Source file path relative to the site root
    pub source: String,

    /// Full source file path
    pub full_source: PathBuf,

    /// Custom front-matter fields
    #[serde(skip)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Post {
    /// Create a post with minimal required fields
    pub fn new(slug: String, title: String, date: DateTime<Tz>) -> Self {
        Self {
            slug,
            title,
            date,
            description: String::new(),
            tags: Vec::new(),
            thumbnail: None,
            draft: false,
            raw: String::new(),
            html: String::new(),
            excerpt: String::new(),
            headings: Vec::new(),
            time_to_read: 1,
            source: String::new(),
            full_source: PathBuf::new(),
            extra: HashMap::new(),
        }
    }

    /// Builder-style tag setter, mostly for fixtures
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// The description when present, else the excerpt
    pub fn description_or_excerpt(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.excerpt
        } else {
            &self.description
        }
    }

    /// Whether the post carries a tag (case-insensitive)
    pub fn has_tag(&self, slug: &str) -> bool {
        let slug = slug.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == slug)
    }

    /// Slug without the leading slash
    pub fn slug_name(&self) -> &str {
        self.slug.trim_start_matches('/')
    }

    /// Site-relative URL path (`/react-hooks-1/`)
    pub fn path(&self) -> String {
        format!("/{}/", self.slug_name())
    }
}

/// Sort posts newest first, ties by slug
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
}

/// Minutes to read `text`; ASCII words and Hangul runs count alike
pub fn time_to_read(text: &str) -> usize {
    let words = text.split_whitespace().filter(|w| w.chars().any(char::is_alphanumeric)).count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// A standalone page (about, ...)
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: String,

    /// Site-relative URL path (`/about/`)
    pub path: String,

    /// Rendered HTML body
    pub html: String,

    pub description: String,

    pub source: String,
}

impl Page {
    pub fn new(title: String, path: String, html: String) -> Self {
        Self {
            title,
            path,
            html,
            description: String::new(),
            source: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Seoul;

    fn post(slug: &str, day: u32) -> Post {
        Post::new(
            slug.to_string(),
            slug.to_string(),
            Seoul.with_ymd_and_hms(2020, 7, day, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_description_fallback() {
        let mut p = post("/a", 1);
        p.excerpt = "excerpt".to_string();
        assert_eq!(p.description_or_excerpt(), "excerpt");
        p.description = "desc".to_string();
        assert_eq!(p.description_or_excerpt(), "desc");
    }

    #[test]
    fn test_sort_posts() {
        let mut posts = vec![post("/b", 1), post("/c", 3), post("/a", 1)];
        sort_posts(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn test_time_to_read() {
        assert_eq!(time_to_read(""), 1);
        assert_eq!(time_to_read(&"word ".repeat(265)), 1);
        assert_eq!(time_to_read(&"word ".repeat(266)), 2);
        assert_eq!(time_to_read("안녕 하세요 -- !!"), 1);
    }

    #[test]
    fn test_has_tag_and_path() {
        let p = post("/react-hooks-1", 1).with_tags(["React", "lecture"]);
        assert!(p.has_tag("react"));
        assert!(!p.has_tag("svelte"));
        assert_eq!(p.path(), "/react-hooks-1/");
        assert_eq!(p.slug_name(), "react-hooks-1");
        assert!(p.with_tags(["Ärger"]).has_tag("äRGER"));
    }
}
