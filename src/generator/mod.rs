//! Generator module - renders the site into the public directory

use anyhow::{Context as _, Result};
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use std::fs;
use std::path::Path;

use tera::Context;
use walkdir::WalkDir;

use crate::content::{Page, Post};
use crate::error::ContentError;
use crate::helpers::{
    date_formal, date_long_ko, escape_xml, facebook_share_url, from_now_ko, full_url_for,
    html_escape, mail_share_url, prune, toc, twitter_share_url, url_for,
};
use crate::relations::{PostRef, Relations};
use crate::search::SearchIndex;
use crate::taxonomy::{Tag, Taxonomy};
use crate::templates::{
    GroupView, MenuItem, MetaData, PageView, PortfolioView, PostSummary, PostView, RefView,
    ShareLinks, SiteData, TagView, TemplateRenderer, STYLESHEET,
};
use crate::Blog;

/// Search input debounce on the search page
const SEARCH_DEBOUNCE_MS: u64 = 250;

/// Fallback `og:image`
const DEFAULT_IMAGE: &str = "images/logo.png";

const ABOUT_PATH: &str = "/about/";
const PORTFOLIO_PATH: &str = "/portfolio/";
const SEARCH_PATH: &str = "/search/";

/// Output paths a post slug may not take; `/about/` is handled separately
const RESERVED_PATHS: &[&str] = &[
    PORTFOLIO_PATH,
    SEARCH_PATH,
    "/tags/",
    "/css/",
    "/images/",
    "/404.html/",
    "/search.json/",
    "/sitemap.xml/",
    "/robots.txt/",
];

/// Portfolio descriptions are cut to this many characters
const PORTFOLIO_EXCERPT_LENGTH: usize = 300;

/// Static site generator using Tera templates
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    now: DateTime<Utc>,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new()?,
            now: Utc::now(),
        })
    }

    /// Generate the entire site
    pub fn generate(&self, posts: &[Post], pages: &[Page]) -> Result<()> {
        check_output_paths(posts, pages)?;
        // A post may stand in for the about page
        let about_placeholder = !pages.iter().any(|p| p.path == ABOUT_PATH)
            && !posts.iter().any(|p| same_path(&p.path(), ABOUT_PATH));

        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        let taxonomy = Taxonomy::build(&self.blog.config, posts);
        let relations = Relations::derive(posts, &taxonomy, &self.blog.config.relations);
        let site = self.build_site_data();

        self.write_output("css/style.css", STYLESHEET)?;
        self.copy_images()?;

        self.generate_index_pages(posts, &taxonomy, &site)?;
        self.generate_post_pages(posts, &taxonomy, &relations, &site)?;
        self.generate_portfolio_page(&taxonomy, &site)?;
        self.generate_page_pages(pages, about_placeholder, &site)?;
        self.generate_search_page(posts, &site)?;
        self.generate_not_found_page(&site)?;

        self.generate_sitemap(posts, pages, about_placeholder, &taxonomy)?;
        self.generate_robots()?;

        tracing::info!(
            "Generated {} posts, {} tag pages, {} pages",
            posts.len(),
            taxonomy.tags().count(),
            pages.len()
        );
        Ok(())
    }

    fn build_site_data(&self) -> SiteData {
        let config = &self.blog.config;
        let menu = [
            ("포스트", "/"),
            ("포트폴리오", PORTFOLIO_PATH),
            ("소개", ABOUT_PATH),
            ("검색", SEARCH_PATH),
        ]
        .iter()
        .map(|(name, path)| MenuItem {
            name: name.to_string(),
            path: path.to_string(),
        })
        .collect();

        SiteData {
            title: html_escape(&config.title),
            author: html_escape(&config.author),
            description: html_escape(&config.description),
            url: config.base_url().to_string(),
            language: config.language.clone(),
            analytics_id: config
                .google_analytics_tracking_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .map(html_escape),
            year: self.now.with_timezone(&config.tz()).year(),
            menu,
        }
    }

    /// SEO metadata; `title` is `None` for the site root
    fn build_meta(
        &self,
        title: Option<&str>,
        description: &str,
        image: Option<&str>,
        path: &str,
    ) -> MetaData {
        let config = &self.blog.config;
        let (full_title, og_title) = match title {
            Some(title) => (format!("{} | {}", title, config.title), title.to_string()),
            None => (config.title.clone(), config.title.clone()),
        };
        let description = if description.trim().is_empty() {
            config.description.as_str()
        } else {
            description
        };
        let image = image
            .map(|thumbnail| format!("images/{}", thumbnail.trim_start_matches('/')))
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string());

        MetaData {
            title: html_escape(&full_title),
            og_title: html_escape(&og_title),
            description: html_escape(description),
            image: full_url_for(config, &image),
            url: full_url_for(config, path),
            path: path.to_string(),
            excluded: config.is_excluded(path),
        }
    }

    fn base_context(&self, site: &SiteData, meta: &MetaData, current_path: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("meta", meta);
        context.insert("current_path", current_path);
        context
    }

    /// Generate the index and one page per tag
    fn generate_index_pages(
        &self,
        posts: &[Post],
        taxonomy: &Taxonomy,
        site: &SiteData,
    ) -> Result<()> {
        let groups: Vec<GroupView> = taxonomy
            .groups()
            .iter()
            .map(|g| GroupView {
                slug: g.slug.clone(),
                name: html_escape(&g.name),
                color: g.color.clone(),
                tags: g.tags.iter().map(tag_view).collect(),
            })
            .collect();

        let summaries: Vec<PostSummary> =
            posts.iter().map(|p| self.post_summary(p, taxonomy)).collect();

        let meta = self.build_meta(None, &self.blog.config.description, None, "/");
        let mut context = self.base_context(site, &meta, "/");
        context.insert("groups", &groups);
        context.insert("posts", &summaries);
        context.insert("total_count", &posts.len());
        context.insert("selected_tag", &None::<TagView>);
        let html = self.renderer.render("index.html", &context)?;
        self.write_output("index.html", &html)?;

        for tag in taxonomy.tags() {
            let tagged: Vec<PostSummary> = taxonomy
                .posts_with_tag(posts, &tag.slug)
                .into_iter()
                .map(|p| self.post_summary(p, taxonomy))
                .collect();

            let path = tag_path(tag);
            let meta = self.build_meta(
                Some(&format!("{} 포스트", tag.name)),
                &self.blog.config.description,
                None,
                &path,
            );
            let mut context = self.base_context(site, &meta, "/");
            context.insert("groups", &groups);
            context.insert("posts", &tagged);
            context.insert("total_count", &posts.len());
            context.insert("selected_tag", &tag_view(tag));

            let html = self.renderer.render("index.html", &context)?;
            self.write_output(&format!("{}index.html", path.trim_start_matches('/')), &html)?;
        }

        Ok(())
    }

    fn post_summary(&self, post: &Post, taxonomy: &Taxonomy) -> PostSummary {
        PostSummary {
            path: post.path(),
            title: html_escape(&post.title),
            excerpt: html_escape(&prune(
                post.description_or_excerpt(),
                self.blog.config.excerpt_length,
            )),
            date: date_formal(&post.date),
            time_to_read: post.time_to_read,
            thumbnail: post
                .thumbnail
                .as_deref()
                .map(|t| url_for(&format!("images/{}", t.trim_start_matches('/')))),
            tags: taxonomy.tags_of(post).into_iter().map(tag_view).collect(),
        }
    }

    /// Generate individual post pages
    fn generate_post_pages(
        &self,
        posts: &[Post],
        taxonomy: &Taxonomy,
        relations: &Relations,
        site: &SiteData,
    ) -> Result<()> {
        let config = &self.blog.config;

        for post in posts {
            let related = relations.get(&post.slug);
            let path = post.path();
            let url = full_url_for(config, &path);
            let description = post.description_or_excerpt();

            let view = PostView {
                title: html_escape(&post.title),
                description: html_escape(description),
                html: post.html.clone(),
                toc: toc(&post.headings, config.toc_max_depth),
                url: url.clone(),
                tags: taxonomy.tags_of(post).into_iter().map(tag_view).collect(),
                date_formal: date_formal(&post.date),
                date_long: date_long_ko(&post.date),
                date_from_now: from_now_ko(&post.date, &self.now),
                time_to_read: post.time_to_read,
                share: ShareLinks {
                    twitter: twitter_share_url(&post.title, &url),
                    facebook: config
                        .facebook_app_id
                        .as_deref()
                        .map(|id| facebook_share_url(id, &url)),
                    mail: mail_share_url(&post.title, &url),
                },
                parts: ref_views(&related.parts, &post.slug),
                category: ref_views(&related.category, &post.slug),
                related: ref_views(&related.related, &post.slug),
            };

            let meta =
                self.build_meta(Some(&post.title), description, post.thumbnail.as_deref(), &path);
            let mut context = self.base_context(site, &meta, &path);
            context.insert("post", &view);

            let html = self
                .renderer
                .render("post.html", &context)
                .with_context(|| format!("Failed to render post {}", post.slug))?;
            self.write_output(&format!("{}/index.html", post.slug_name()), &html)?;
            tracing::debug!("Generated post: {}", post.slug);
        }

        Ok(())
    }

    fn generate_portfolio_page(&self, taxonomy: &Taxonomy, site: &SiteData) -> Result<()> {
        let portfolios: Vec<PortfolioView> = taxonomy
            .portfolios()
            .iter()
            .map(|p| PortfolioView {
                slug: p.slug.clone(),
                title: html_escape(&p.title),
                description: html_escape(&prune(&p.description, PORTFOLIO_EXCERPT_LENGTH)),
                url: p.url.clone(),
                image: p.image.clone(),
                date: p.date.as_ref().map(date_long_ko),
                tags: p.tags.iter().map(tag_view).collect(),
            })
            .collect();

        let meta = self.build_meta(Some("포트폴리오"), "", None, PORTFOLIO_PATH);
        let mut context = self.base_context(site, &meta, PORTFOLIO_PATH);
        context.insert("portfolios", &portfolios);
        let html = self.renderer.render("portfolio.html", &context)?;
        self.write_output("portfolio/index.html", &html)
    }

    /// Generate standalone pages, with a placeholder about page when missing
    fn generate_page_pages(
        &self,
        pages: &[Page],
        about_placeholder: bool,
        site: &SiteData,
    ) -> Result<()> {
        for page in pages {
            let view = PageView {
                title: html_escape(&page.title),
                html: page.html.clone(),
            };
            self.render_page(&view, &page.description, &page.path, site)?;
        }

        if about_placeholder {
            let view = PageView {
                title: "소개".to_string(),
                html: String::new(),
            };
            self.render_page(&view, "", ABOUT_PATH, site)?;
        }

        Ok(())
    }

    fn render_page(
        &self,
        view: &PageView,
        description: &str,
        path: &str,
        site: &SiteData,
    ) -> Result<()> {
        let meta = self.build_meta(Some(&view.title), description, None, path);
        let mut context = self.base_context(site, &meta, path);
        context.insert("page", view);
        let html = self
            .renderer
            .render("page.html", &context)
            .with_context(|| format!("Failed to render page {}", path))?;
        self.write_output(&format!("{}index.html", path.trim_start_matches('/')), &html)
    }

    /// Generate the search page and its JSON index
    fn generate_search_page(&self, posts: &[Post], site: &SiteData) -> Result<()> {
        let meta = self.build_meta(Some("포스트 검색"), "", None, SEARCH_PATH);
        let mut context = self.base_context(site, &meta, SEARCH_PATH);
        context.insert("debounce_ms", &SEARCH_DEBOUNCE_MS);
        let html = self.renderer.render("search.html", &context)?;
        self.write_output("search/index.html", &html)?;

        let index = SearchIndex::build(posts, self.blog.config.search_excerpt_length);
        index.write(&self.blog.public_dir.join("search.json"))?;
        tracing::info!("Generated search.json");
        Ok(())
    }

    fn generate_not_found_page(&self, site: &SiteData) -> Result<()> {
        let meta = self.build_meta(Some("404"), "", None, "/404.html");
        let context = self.base_context(site, &meta, "/404.html");
        let html = self.renderer.render("404.html", &context)?;
        self.write_output("404.html", &html)
    }

    /// Generate sitemap.xml
    fn generate_sitemap(
        &self,
        posts: &[Post],
        pages: &[Page],
        about_placeholder: bool,
        taxonomy: &Taxonomy,
    ) -> Result<()> {
        let config = &self.blog.config;

        let mut entries: Vec<(String, Option<&DateTime<Tz>>, &str, &str)> =
            vec![("/".to_string(), None, "daily", "0.3")];
        entries.extend(posts.iter().map(|p| (p.path(), Some(&p.date), "weekly", "0.7")));
        entries.extend(taxonomy.tags().map(|t| (tag_path(t), None, "daily", "0.5")));
        entries.push((PORTFOLIO_PATH.to_string(), None, "daily", "0.5"));
        entries.extend(pages.iter().map(|p| (p.path.clone(), None, "daily", "0.5")));
        if about_placeholder {
            entries.push((ABOUT_PATH.to_string(), None, "daily", "0.5"));
        }
        entries.push((SEARCH_PATH.to_string(), None, "daily", "0.5"));

        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for (path, lastmod, changefreq, priority) in entries {
            if config.is_excluded(&path) {
                tracing::debug!("Sitemap excludes {}", path);
                continue;
            }
            xml.push_str("  <url>\n");
            xml.push_str(&format!(
                "    <loc>{}</loc>\n",
                escape_xml(&full_url_for(config, &path))
            ));
            if let Some(date) = lastmod {
                xml.push_str(&format!("    <lastmod>{}</lastmod>\n", date_formal(date)));
            }
            xml.push_str(&format!("    <changefreq>{}</changefreq>\n", changefreq));
            xml.push_str(&format!("    <priority>{}</priority>\n", priority));
            xml.push_str("  </url>\n");
        }
        xml.push_str("</urlset>\n");

        self.write_output("sitemap.xml", &xml)?;
        tracing::info!("Generated sitemap.xml");
        Ok(())
    }

    fn generate_robots(&self) -> Result<()> {
        let robots = format!(
            "User-agent: *\nAllow: /\nSitemap: {}\nHost: {}\n",
            full_url_for(&self.blog.config, "sitemap.xml"),
            self.blog.config.base_url()
        );
        self.write_output("robots.txt", &robots)
    }

    /// Copy the images directory to `public/images`
    fn copy_images(&self) -> Result<()> {
        let images_dir = &self.blog.images_dir;
        if !images_dir.exists() {
            return Ok(());
        }

        let target = self.blog.public_dir.join("images");
        for entry in WalkDir::new(images_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let dest = target.join(path.strip_prefix(images_dir)?);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest).with_context(|| format!("Failed to copy {:?}", path))?;
        }

        Ok(())
    }

    /// Write a file relative to the public directory
    fn write_output(&self, relative: &str, contents: &str) -> Result<()> {
        let output_path = self.blog.public_dir.join(Path::new(relative));
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, contents)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

/// Reject posts whose page would overwrite a generated page or a standalone page
fn check_output_paths(posts: &[Post], pages: &[Page]) -> Result<(), ContentError> {
    for post in posts {
        let path = post.path();
        if let Some(reserved) = RESERVED_PATHS.iter().find(|r| same_path(&path, r)) {
            return Err(ContentError::ReservedSlug {
                slug: post.slug.clone(),
                path: reserved.to_string(),
            });
        }
        if let Some(page) = pages.iter().find(|p| same_path(&path, &p.path)) {
            return Err(ContentError::SlugConflict {
                slug: post.slug.clone(),
                page: page.path.clone(),
            });
        }
    }
    Ok(())
}

/// Output paths compare case-insensitively, as on macOS and Windows
fn same_path(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Site-relative path of a tag page (`/tags/python/`)
pub fn tag_path(tag: &Tag) -> String {
    format!("/tags/{}/", tag.slug)
}

fn tag_view(tag: &Tag) -> TagView {
    TagView {
        slug: tag.slug.clone(),
        name: html_escape(&tag.name),
        color: tag.color.clone(),
        count: tag.count,
        path: tag_path(tag),
    }
}

fn ref_views(refs: &[PostRef], current: &str) -> Vec<RefView> {
    refs.iter()
        .map(|r| RefView {
            path: format!("/{}/", r.slug.trim_start_matches('/')),
            title: html_escape(&r.title),
            date: date_formal(&r.date),
            current: r.slug == current,
        })
        .collect()
}
