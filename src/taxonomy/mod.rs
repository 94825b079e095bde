//! Tag, tag group and portfolio entities synthesized from the site config

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::SiteConfig;
use crate::content::{parse_date_string, Post};

/// A tag declared in `tags:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub slug: String,
    pub name: String,
    /// Slug of the owning group
    pub group: String,
    /// Color of the owning group
    pub color: String,
    /// Number of posts carrying the tag
    pub count: usize,
}

/// A tag group declared in `tag_groups:`, with its tags in config order
#[derive(Debug, Clone, Serialize)]
pub struct TagGroup {
    pub slug: String,
    pub name: String,
    pub color: String,
    pub tags: Vec<Tag>,
}

/// A portfolio entry
#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub image: Option<String>,
    pub date: Option<DateTime<Tz>>,
    pub tags: Vec<Tag>,
}

/// All synthesized taxonomy entities
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    groups: Vec<TagGroup>,
    tags: IndexMap<String, Tag>,
    portfolios: Vec<Portfolio>,
    category_group: String,
}

impl Taxonomy {
    /// Build tags and groups from config, counting posts per tag
    pub fn build(config: &SiteConfig, posts: &[Post]) -> Self {
        let mut tags: IndexMap<String, Tag> = IndexMap::new();
        for (slug, tag) in &config.tags {
            let color = config
                .tag_groups
                .get(&tag.group)
                .map(|g| g.color.clone())
                .unwrap_or_else(|| "gray".to_string());
            let count = posts.iter().filter(|p| p.has_tag(slug)).count();
            tags.insert(
                slug.to_lowercase(),
                Tag {
                    slug: slug.clone(),
                    name: tag.name.clone(),
                    group: tag.group.clone(),
                    color,
                    count,
                },
            );
        }

        let groups = config
            .tag_groups
            .iter()
            .map(|(slug, group)| TagGroup {
                slug: slug.clone(),
                name: group.name.clone(),
                color: group.color.clone(),
                tags: tags.values().filter(|t| &t.group == slug).cloned().collect(),
            })
            .collect();

        for tag in &undeclared_tags(&tags, posts) {
            tracing::warn!("Tag `{}` is used by posts but not declared in config", tag);
        }

        let mut taxonomy = Self {
            groups,
            tags,
            portfolios: Vec::new(),
            category_group: config.relations.category_group.clone(),
        };
        taxonomy.portfolios = taxonomy.build_portfolios(config);
        taxonomy
    }

    fn build_portfolios(&self, config: &SiteConfig) -> Vec<Portfolio> {
        let tz = config.tz();
        let mut portfolios: Vec<Portfolio> = config
            .portfolios
            .iter()
            .map(|p| Portfolio {
                slug: p.slug.clone(),
                title: p.title.clone(),
                description: p.description.clone(),
                url: p.url.clone(),
                image: p.image.clone(),
                date: p.date.as_deref().and_then(|d| {
                    let parsed = parse_date_string(d, &tz);
                    if parsed.is_none() {
                        tracing::warn!("Portfolio `{}` has unparsable date {:?}", p.slug, d);
                    }
                    parsed
                }),
                tags: p.tags.iter().filter_map(|t| self.tag(t).cloned()).collect(),
            })
            .collect();

        // Undated entries sort last
        let epoch = tz.timestamp_opt(0, 0).single();
        portfolios.sort_by(|a, b| b.date.or(epoch).cmp(&a.date.or(epoch)));
        portfolios
    }

    /// Tag groups in config order
    pub fn groups(&self) -> &[TagGroup] {
        &self.groups
    }

    /// All tags in config order
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    /// Portfolio entries, newest first
    pub fn portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    /// Look up a tag by slug (case-insensitive)
    pub fn tag(&self, slug: &str) -> Option<&Tag> {
        self.tags.get(&slug.to_lowercase())
    }

    /// Look up a group by slug
    pub fn group(&self, slug: &str) -> Option<&TagGroup> {
        self.groups.iter().find(|g| g.slug == slug)
    }

    /// Declared tags of a post, in config order
    pub fn tags_of(&self, post: &Post) -> Vec<&Tag> {
        self.tags.values().filter(|t| post.has_tag(&t.slug)).collect()
    }

    /// Global post count of a tag, zero for undeclared tags
    pub fn count(&self, slug: &str) -> usize {
        self.tag(slug).map(|t| t.count).unwrap_or(0)
    }

    /// Lower-cased slugs of the post's tags that belong to the category group
    pub fn category_set(&self, post: &Post) -> BTreeSet<String> {
        post.tags
            .iter()
            .filter_map(|t| self.tag(t))
            .filter(|t| t.group == self.category_group)
            .map(|t| t.slug.to_lowercase())
            .collect()
    }

    /// Posts carrying a tag, preserving input order
    pub fn posts_with_tag<'p>(&self, posts: &'p [Post], slug: &str) -> Vec<&'p Post> {
        posts.iter().filter(|p| p.has_tag(slug)).collect()
    }
}

/// Lower-cased tags used by posts but missing from config
fn undeclared_tags(declared: &IndexMap<String, Tag>, posts: &[Post]) -> BTreeSet<String> {
    posts
        .iter()
        .flat_map(|p| p.tags.iter())
        .map(|t| t.to_lowercase())
        .filter(|t| !declared.contains_key(t))
        .collect()
}
