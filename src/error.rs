//! Domain errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating `_config.yml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tag `{tag}` refers to unknown tag group `{group}`")]
    UnknownTagGroup { tag: String, group: String },

    #[error("tag group `{group}` uses unknown color `{color}`")]
    UnknownColor { group: String, color: String },

    #[error("portfolio `{0}` is defined more than once")]
    DuplicatePortfolio(String),

    #[error("site_url must be an absolute http(s) URL, got `{0}`")]
    InvalidSiteUrl(String),

    #[error("invalid sitemap exclude pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Errors raised while loading content
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("slug `{slug}` is produced by both {first:?} and {second:?}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("cannot derive a slug from {0:?}")]
    InvalidSlug(PathBuf),

    #[error("post `{slug}` would overwrite the generated `{path}`")]
    ReservedSlug { slug: String, path: String },

    #[error("post `{slug}` and page `{page}` render to the same URL")]
    SlugConflict { slug: String, page: String },
}
