//! Post relationship derivation
//!
//! For every post three lists are derived at build time:
//!
//! * **parts**: the post's multi-part series. Slugs ending in `-<number>`
//!   that share the same prefix form a series, ordered by number.
//! * **category**: other posts whose set of category-group tags is
//!   identical (and non-empty).
//! * **related**: posts sharing tags, narrowed greedily by the post's rarest
//!   tags until at most `related_limit` candidates remain.

use chrono::DateTime;
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::RelationsConfig;
use crate::content::Post;
use crate::taxonomy::Taxonomy;

lazy_static! {
    static ref PART_SLUG: Regex = Regex::new(r"^(.+)-(\d+)$").unwrap();
}

/// Lightweight reference to a post, as rendered in navigation lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRef {
    pub slug: String,
    pub title: String,
    pub date: DateTime<Tz>,
}

impl From<&Post> for PostRef {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            date: post.date,
        }
    }
}

/// Relationships of a single post
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostRelations {
    /// Ordered series members, including the post itself
    pub parts: Vec<PostRef>,
    /// Posts with an identical category set, newest first
    pub category: Vec<PostRef>,
    /// Related posts, best match first
    pub related: Vec<PostRef>,
}

/// Relationships for every post, keyed by slug
#[derive(Debug, Clone, Default)]
pub struct Relations {
    by_slug: HashMap<String, PostRelations>,
}

/// Split a slug into its series name and part number
///
/// ```ignore
/// part_key("/react-hooks-2") // -> Some(("react-hooks", 2))
/// ```
pub fn part_key(slug: &str) -> Option<(&str, u32)> {
    let name = slug.trim_start_matches('/');
    let caps = PART_SLUG.captures(name)?;
    let number = caps.get(2)?.as_str().parse().ok()?;
    Some((caps.get(1)?.as_str(), number))
}

impl Relations {
    /// Derive relationships for all posts
    pub fn derive(posts: &[Post], taxonomy: &Taxonomy, options: &RelationsConfig) -> Self {
        let series = part_series(posts, options.min_parts);
        let categories: Vec<BTreeSet<String>> =
            posts.iter().map(|p| taxonomy.category_set(p)).collect();

        let mut by_slug = HashMap::with_capacity(posts.len());
        for (i, post) in posts.iter().enumerate() {
            let parts: Vec<usize> = part_key(&post.slug)
                .and_then(|(name, _)| series.get(name))
                .cloned()
                .unwrap_or_default();

            let relations = PostRelations {
                parts: parts.iter().map(|&j| PostRef::from(&posts[j])).collect(),
                category: category_siblings(posts, &categories, i)
                    .into_iter()
                    .map(|j| PostRef::from(&posts[j]))
                    .collect(),
                related: related_posts(posts, taxonomy, i, &parts, options.related_limit)
                    .into_iter()
                    .map(|j| PostRef::from(&posts[j]))
                    .collect(),
            };

            tracing::debug!(
                "{}: {} parts, {} category, {} related",
                post.slug,
                relations.parts.len(),
                relations.category.len(),
                relations.related.len()
            );
            by_slug.insert(post.slug.clone(), relations);
        }

        Self { by_slug }
    }

    /// Relationships of a post; empty for unknown slugs
    pub fn get(&self, slug: &str) -> PostRelations {
        self.by_slug.get(slug).cloned().unwrap_or_default()
    }

    /// All series with at least the minimum number of parts, by name
    pub fn series(&self) -> BTreeMap<String, Vec<PostRef>> {
        let mut series = BTreeMap::new();
        for relations in self.by_slug.values() {
            if let Some(first) = relations.parts.first() {
                if let Some((name, _)) = part_key(&first.slug) {
                    series
                        .entry(name.to_string())
                        .or_insert_with(|| relations.parts.clone());
                }
            }
        }
        series
    }
}

/// Group post indices into part series, keyed by series name
fn part_series(posts: &[Post], min_parts: usize) -> HashMap<String, Vec<usize>> {
    let mut groups: HashMap<String, Vec<(u32, usize)>> = HashMap::new();
    for (i, post) in posts.iter().enumerate() {
        if let Some((name, number)) = part_key(&post.slug) {
            groups.entry(name.to_string()).or_default().push((number, i));
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= min_parts.max(1))
        .map(|(name, mut members)| {
            members.sort_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| posts[a.1].date.cmp(&posts[b.1].date))
            });
            (name, members.into_iter().map(|(_, i)| i).collect())
        })
        .collect()
}

/// Other posts with the same non-empty category set, newest first
fn category_siblings(posts: &[Post], categories: &[BTreeSet<String>], i: usize) -> Vec<usize> {
    let own = &categories[i];
    if own.is_empty() {
        return Vec::new();
    }

    let mut siblings: Vec<usize> = (0..posts.len())
        .filter(|&j| j != i && &categories[j] == own)
        .collect();
    siblings.sort_by(|&a, &b| posts[b].date.cmp(&posts[a].date));
    siblings
}

/// Greedy tag-overlap narrowing
fn related_posts(
    posts: &[Post],
    taxonomy: &Taxonomy,
    i: usize,
    series: &[usize],
    limit: usize,
) -> Vec<usize> {
    let post = &posts[i];
    let own_tags: Vec<String> = dedup_lowercase(&post.tags);
    if own_tags.is_empty() || limit == 0 {
        return Vec::new();
    }

    let overlap = |j: usize| own_tags.iter().filter(|t| posts[j].has_tag(t)).count();

    let mut candidates: Vec<usize> = (0..posts.len())
        .filter(|&j| j != i && !series.contains(&j) && overlap(j) > 0)
        .collect();

    // Rarest tags narrow the most; stable sort keeps front-matter order on ties
    let mut narrowing = own_tags.clone();
    narrowing.sort_by_key(|t| taxonomy.count(t));

    for tag in &narrowing {
        if candidates.len() <= limit {
            break;
        }
        let narrowed: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&j| posts[j].has_tag(tag))
            .collect();
        if !narrowed.is_empty() {
            candidates = narrowed;
        }
    }

    candidates.sort_by(|&a, &b| {
        overlap(b)
            .cmp(&overlap(a))
            .then_with(|| posts[b].date.cmp(&posts[a].date))
            .then_with(|| posts[a].slug.cmp(&posts[b].slug))
    });
    candidates.truncate(limit);
    candidates
}

fn dedup_lowercase(tags: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.iter()
        .map(|t| t.to_lowercase())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use chrono::TimeZone;
    use chrono_tz::Asia::Seoul;

    fn config() -> SiteConfig {
        serde_yaml::from_str(
            r#"
tag_groups:
  category: { name: 카테고리, color: red }
  proglang: { name: 언어, color: blue }
  framework: { name: 프레임워크, color: violet }
tags:
  lecture: { name: 강의, group: category }
  tip: { name: 팁, group: category }
  diy: { name: DIY, group: category }
  javascript: { name: JavaScript, group: proglang }
  typescript: { name: TypeScript, group: proglang }
  python: { name: Python, group: proglang }
  react: { name: React, group: framework }
  svelte: { name: Svelte, group: framework }
  django: { name: Django, group: framework }
"#,
        )
        .unwrap()
    }

    fn post(slug: &str, day: u32, tags: &[&str]) -> Post {
        Post::new(
            slug.to_string(),
            format!("title of {}", slug),
            Seoul.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap(),
        )
        .with_tags(tags.iter().copied())
    }

    fn derive(posts: &[Post]) -> Relations {
        let config = config();
        let taxonomy = Taxonomy::build(&config, posts);
        Relations::derive(posts, &taxonomy, &config.relations)
    }

    fn slugs(refs: &[PostRef]) -> Vec<&str> {
        refs.iter().map(|r| r.slug.as_str()).collect()
    }

    #[test]
    fn test_part_key() {
        assert_eq!(part_key("/react-hooks-2"), Some(("react-hooks", 2)));
        assert_eq!(part_key("intro-10"), Some(("intro", 10)));
        assert_eq!(part_key("/es-2015-3"), Some(("es-2015", 3)));
        assert_eq!(part_key("/python3"), None);
        assert_eq!(part_key("/-1"), None);
        assert_eq!(part_key("/plain"), None);
    }

    #[test]
    fn test_parts_are_ordered_by_number() {
        let posts = vec![
            post("/hooks-10", 5, &[]),
            post("/hooks-2", 4, &[]),
            post("/hooks-1", 3, &[]),
            post("/lonely-1", 2, &[]),
            post("/other", 1, &[]),
        ];
        let relations = derive(&posts);

        let parts = relations.get("/hooks-2").parts;
        assert_eq!(slugs(&parts), vec!["/hooks-1", "/hooks-2", "/hooks-10"]);
        assert_eq!(relations.get("/hooks-10").parts.len(), 3);
        assert!(relations.get("/lonely-1").parts.is_empty());
        assert!(relations.get("/other").parts.is_empty());

        let series = relations.series();
        assert_eq!(series.len(), 1);
        assert_eq!(slugs(&series["hooks"]), vec!["/hooks-1", "/hooks-2", "/hooks-10"]);
    }

    #[test]
    fn test_duplicate_part_numbers_order_by_date() {
        let posts = vec![
            post("/a-01", 1, &[]),
            post("/a-1", 2, &[]),
            post("/a-2", 3, &[]),
        ];
        let relations = derive(&posts);
        assert_eq!(slugs(&relations.get("/a-2").parts), vec!["/a-01", "/a-1", "/a-2"]);

        let posts = vec![
            post("/a-01", 2, &[]),
            post("/a-1", 1, &[]),
            post("/a-2", 3, &[]),
        ];
        let relations = derive(&posts);
        assert_eq!(slugs(&relations.get("/a-2").parts), vec!["/a-1", "/a-01", "/a-2"]);
    }

    #[test]
    fn test_category_siblings_need_identical_sets() {
        let posts = vec![
            post("/a", 4, &["lecture", "react"]),
            post("/b", 3, &["Lecture", "python"]),
            post("/c", 2, &["lecture", "tip"]),
            post("/d", 1, &["react"]),
            post("/e", 5, &["lecture"]),
        ];
        let relations = derive(&posts);

        assert_eq!(slugs(&relations.get("/a").category), vec!["/e", "/b"]);
        assert!(relations.get("/c").category.is_empty());
        assert!(relations.get("/d").category.is_empty());
    }

    #[test]
    fn test_related_excludes_self_and_series() {
        let posts = vec![
            post("/react-1", 3, &["lecture", "react"]),
            post("/react-2", 4, &["lecture", "react"]),
            post("/react-tip", 2, &["tip", "react"]),
            post("/django", 1, &["python", "django"]),
        ];
        let relations = derive(&posts);

        let related = relations.get("/react-1").related;
        assert_eq!(slugs(&related), vec!["/react-tip"]);
        assert!(relations.get("/django").related.is_empty());
    }

    #[test]
    fn test_related_greedy_narrowing_uses_rarest_tag() {
        // "javascript" is common, "svelte" is rare
        let mut posts = vec![post("/target", 28, &["javascript", "svelte"])];
        for day in 1..=7 {
            posts.push(post(&format!("/js-{}", day), day, &["javascript"]));
        }
        posts.push(post("/svelte-a", 10, &["svelte", "javascript"]));
        posts.push(post("/svelte-b", 11, &["svelte"]));

        let relations = derive(&posts);
        let related = relations.get("/target").related;
        // Overlap 2 sorts before overlap 1
        assert_eq!(slugs(&related), vec!["/svelte-a", "/svelte-b"]);
    }

    #[test]
    fn test_related_capped_at_limit() {
        let mut posts = vec![post("/target", 28, &["python"])];
        for day in 1..=9 {
            posts.push(post(&format!("/py{}", day), day, &["python"]));
        }
        let relations = derive(&posts);
        let related = relations.get("/target").related;
        assert_eq!(related.len(), 5);
        // Same overlap, so newest first
        assert_eq!(
            slugs(&related),
            vec!["/py9", "/py8", "/py7", "/py6", "/py5"]
        );
    }

    #[test]
    fn test_narrowing_skips_tags_that_empty_the_set() {
        let mut posts = vec![post("/target", 28, &["django", "python"])];
        for day in 1..=7 {
            posts.push(post(&format!("/py{}", day), day, &["python"]));
        }
        let config = config();
        let taxonomy = Taxonomy::build(&config, &posts);
        // "django" only appears on the target, so narrowing by it would empty the set
        let related = related_posts(&posts, &taxonomy, 0, &[], 5);
        assert_eq!(related.len(), 5);
    }

    #[test]
    fn test_narrowing_ties_follow_front_matter_order() {
        // "tip" and "diy" are on four posts each
        let others = vec![
            post("/ta", 1, &["tip"]),
            post("/tb", 2, &["tip"]),
            post("/tc", 3, &["tip"]),
            post("/da", 4, &["diy"]),
            post("/db", 5, &["diy"]),
            post("/dc", 6, &["diy"]),
        ];

        let mut posts = vec![post("/mine", 10, &["tip", "diy"])];
        posts.extend(others.iter().cloned());
        let related = derive(&posts).get("/mine").related;
        assert_eq!(slugs(&related), vec!["/tc", "/tb", "/ta"]);

        let mut posts = vec![post("/mine", 10, &["diy", "tip"])];
        posts.extend(others.iter().cloned());
        let related = derive(&posts).get("/mine").related;
        assert_eq!(slugs(&related), vec!["/dc", "/db", "/da"]);
    }

    #[test]
    fn test_unknown_slug_has_no_relations() {
        let relations = derive(&[]);
        let r = relations.get("/missing");
        assert!(r.parts.is_empty() && r.category.is_empty() && r.related.is_empty());
    }
}
