//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Colors a tag group may use (open-color palette)
pub const PALETTE: &[&str] = &[
    "gray", "red", "pink", "grape", "violet", "indigo", "blue", "cyan", "teal", "green", "lime",
    "yellow", "orange",
];

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,
    pub site_url: String,
    pub language: String,
    pub timezone: String,
    pub google_analytics_tracking_id: Option<String>,
    pub facebook_app_id: Option<String>,

    // Directory
    pub contents_dir: String,
    pub posts_dir: String,
    pub pages_dir: String,
    pub images_dir: String,
    pub public_dir: String,

    // Writing
    pub excerpt_length: usize,
    pub search_excerpt_length: usize,
    pub toc_max_depth: usize,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Relations
    #[serde(default)]
    pub relations: RelationsConfig,

    // Sitemap
    #[serde(default)]
    pub sitemap: SitemapConfig,

    // Taxonomy
    #[serde(default)]
    pub tag_groups: IndexMap<String, TagGroupConfig>,
    #[serde(default)]
    pub tags: IndexMap<String, TagConfig>,
    #[serde(default)]
    pub portfolios: Vec<PortfolioConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            author: "Anonymous".to_string(),
            description: String::new(),
            site_url: "http://localhost:4000".to_string(),
            language: "ko".to_string(),
            timezone: "Asia/Seoul".to_string(),
            google_analytics_tracking_id: None,
            facebook_app_id: None,

            contents_dir: "contents".to_string(),
            posts_dir: "posts".to_string(),
            pages_dir: "pages".to_string(),
            images_dir: "images".to_string(),
            public_dir: "public".to_string(),

            excerpt_length: 180,
            search_excerpt_length: 200,
            toc_max_depth: 3,
            highlight: HighlightConfig::default(),

            relations: RelationsConfig::default(),
            sitemap: SitemapConfig::default(),

            tag_groups: IndexMap::new(),
            tags: IndexMap::new(),
            portfolios: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML or TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;

        let config: SiteConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config {:?}", path))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config {:?}", path))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Locate the config file in a site directory, preferring YAML
    pub fn locate(base_dir: &Path) -> Option<PathBuf> {
        ["_config.yml", "_config.yaml", "_config.toml"]
            .iter()
            .map(|name| base_dir.join(name))
            .find(|p| p.exists())
    }

    /// Check cross-references between tags, groups and portfolios
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.site_url.starts_with("http://") || self.site_url.starts_with("https://")) {
            return Err(ConfigError::InvalidSiteUrl(self.site_url.clone()));
        }

        for (slug, group) in &self.tag_groups {
            if !PALETTE.contains(&group.color.as_str()) {
                return Err(ConfigError::UnknownColor {
                    group: slug.clone(),
                    color: group.color.clone(),
                });
            }
        }

        for (slug, tag) in &self.tags {
            if !self.tag_groups.contains_key(&tag.group) {
                return Err(ConfigError::UnknownTagGroup {
                    tag: slug.clone(),
                    group: tag.group.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for portfolio in &self.portfolios {
            if !seen.insert(portfolio.slug.as_str()) {
                return Err(ConfigError::DuplicatePortfolio(portfolio.slug.clone()));
            }
        }

        for pattern in &self.sitemap.exclude {
            glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Site URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    /// Parsed display timezone, falling back to UTC
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
            chrono_tz::UTC
        })
    }

    /// Whether a generated path is excluded from the sitemap and analytics
    pub fn is_excluded(&self, path: &str) -> bool {
        self.sitemap
            .exclude
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .any(|p| p.matches(path))
    }
}

/// A tag group entry (`tag_groups.<slug>`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagGroupConfig {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "gray".to_string()
}

/// A tag entry (`tags.<slug>`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    pub name: String,
    pub group: String,
}

/// A portfolio entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: Option<String>,
    pub image: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "InspiredGitHub".to_string(),
            line_number: true,
        }
    }
}

/// Post relationship configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationsConfig {
    pub category_group: String,
    pub related_limit: usize,
    pub min_parts: usize,
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            category_group: "category".to_string(),
            related_limit: 5,
            min_parts: 2,
        }
    }
}

/// Sitemap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    pub exclude: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            exclude: vec!["/search/".to_string()],
        }
    }
}
