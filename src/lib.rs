//! taglog: a static blog generator with a config-driven tag taxonomy
//!
//! Posts are Markdown files with YAML front-matter. Tags and tag groups are
//! declared in `_config.yml`; at build time the generator derives part series,
//! category siblings and related posts for every post and renders the site with
//! embedded Tera templates.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod relations;
pub mod search;
pub mod server;
pub mod taxonomy;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown posts
    pub posts_dir: PathBuf,
    /// Standalone pages
    pub pages_dir: PathBuf,
    /// Images copied verbatim to the output
    pub images_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Render posts marked `draft: true`
    pub include_drafts: bool,
}

impl Blog {
    /// Create a blog instance from a site directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let config = match config::SiteConfig::locate(&base_dir) {
            Some(path) => {
                tracing::debug!("Loading config from {:?}", path);
                config::SiteConfig::load(&path)?
            }
            None => {
                tracing::warn!("No _config.yml in {:?}, using defaults", base_dir);
                config::SiteConfig::default()
            }
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog instance from an already loaded config
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let contents_dir = base_dir.join(&config.contents_dir);
        let posts_dir = contents_dir.join(&config.posts_dir);
        let pages_dir = contents_dir.join(&config.pages_dir);
        let images_dir = contents_dir.join(&config.images_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            posts_dir,
            pages_dir,
            images_dir,
            public_dir,
            include_drafts: false,
        }
    }

    /// Point absolute URLs at another host (the dev server uses this)
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.config.site_url = url.into();
        self
    }

    /// Path of the config file that is watched for changes
    pub fn config_path(&self) -> PathBuf {
        config::SiteConfig::locate(&self.base_dir)
            .unwrap_or_else(|| self.base_dir.join("_config.yml"))
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, slug: Option<&str>) -> Result<PathBuf> {
        commands::new::create_post(self, title, slug)
    }
}
