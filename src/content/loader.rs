//! Content loader - loads posts and pages from the contents directory

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use super::post::{sort_posts, time_to_read};
use super::{FrontMatter, MarkdownRenderer, Page, Post};
use crate::error::ContentError;
use crate::helpers::prune;
use crate::Blog;

/// Loads content from the contents directory
pub struct ContentLoader<'a> {
    blog: &'a Blog,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(blog: &'a Blog) -> Self {
        let renderer = MarkdownRenderer::with_options(
            &blog.config.highlight.theme,
            blog.config.highlight.line_number,
        );
        Self { blog, renderer }
    }

    /// Load all posts, newest first
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        let posts_dir = &self.blog.posts_dir;
        if !posts_dir.exists() {
            tracing::warn!("Posts directory {:?} does not exist", posts_dir);
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(posts_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }

            let post = match self.load_post(path) {
                Ok(post) => post,
                Err(e) => {
                    tracing::warn!("Failed to load post {:?}: {:#}", path, e);
                    continue;
                }
            };

            if post.draft && !self.blog.include_drafts {
                tracing::debug!("Skipping draft {:?}", path);
                continue;
            }

            if let Some(first) = seen.insert(post.slug.clone(), path.to_path_buf()) {
                return Err(ContentError::DuplicateSlug {
                    slug: post.slug,
                    first,
                    second: path.to_path_buf(),
                }
                .into());
            }

            posts.push(post);
        }

        sort_posts(&mut posts);
        Ok(posts)
    }

    /// Load a single post from a file
    pub fn load_post(&self, path: &Path) -> Result<Post> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let (fm, body) = FrontMatter::parse(&content)?;

        let relative = path.strip_prefix(&self.blog.posts_dir).unwrap_or(path);
        let slug = slug_for(relative)?;

        let tz = self.blog.config.tz();
        let date = fm.parse_date(&tz).unwrap_or_else(|| {
            let modified = fs::metadata(path)
                .and_then(|m| m.modified())
                .map(chrono::DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            tracing::debug!("{:?} has no usable date, using mtime", path);
            modified.with_timezone(&tz)
        });

        let title = fm
            .title
            .clone()
            .unwrap_or_else(|| slug.trim_start_matches('/').to_string());

        let rendered = self.renderer.render(body)?;

        let mut post = Post::new(slug, title, date);
        post.description = fm.description.unwrap_or_default();
        post.tags = fm.tags;
        post.thumbnail = fm.thumbnail;
        post.draft = fm.draft;
        post.raw = body.to_string();
        post.html = rendered.html;
        post.excerpt = prune(&rendered.text, self.blog.config.excerpt_length);
        post.time_to_read = time_to_read(&rendered.text);
        post.headings = rendered.headings;
        post.source = path
            .strip_prefix(&self.blog.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        post.full_source = path.to_path_buf();
        post.extra = fm.extra;

        Ok(post)
    }

    /// Load standalone pages from the pages directory
    pub fn load_pages(&self) -> Result<Vec<Page>> {
        let pages_dir = &self.blog.pages_dir;
        if !pages_dir.exists() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in WalkDir::new(pages_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_markdown_file(path) {
                match self.load_page(path) {
                    Ok(page) => pages.push(page),
                    Err(e) => tracing::warn!("Failed to load page {:?}: {:#}", path, e),
                }
            }
        }

        Ok(pages)
    }

    fn load_page(&self, path: &Path) -> Result<Page> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let (fm, body) = FrontMatter::parse(&content)?;

        let relative = path.strip_prefix(&self.blog.pages_dir).unwrap_or(path);
        let page_path = page_path_for(relative);

        let title = fm.title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_string()
        });

        let rendered = self.renderer.render(body)?;

        let mut page = Page::new(title, page_path, rendered.html);
        page.description = fm
            .description
            .unwrap_or_else(|| prune(&rendered.text, self.blog.config.excerpt_length));
        page.source = path.to_string_lossy().replace('\\', "/");
        Ok(page)
    }
}

/// Derive a post slug from its path relative to the posts directory
///
/// The slug is the last path component without extension; `index.md`
/// takes the name of its directory. Paths are NFC-normalized first so
/// decomposed file names (macOS) give the same URL as composed ones.
pub fn slug_for(relative: &Path) -> Result<String, ContentError> {
    let normalized = relative
        .to_string_lossy()
        .nfc()
        .collect::<String>()
        .replace('\\', "/");
    let mut parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();

    let file = parts
        .pop()
        .ok_or_else(|| ContentError::InvalidSlug(relative.to_path_buf()))?;
    let stem = file
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file);

    let name = if stem == "index" {
        parts
            .pop()
            .ok_or_else(|| ContentError::InvalidSlug(relative.to_path_buf()))?
    } else {
        stem
    };

    if name.is_empty() {
        return Err(ContentError::InvalidSlug(relative.to_path_buf()));
    }
    Ok(format!("/{}", name))
}

/// URL path of a standalone page (`about.md` -> `/about/`)
fn page_path_for(relative: &Path) -> String {
    let normalized = relative.to_string_lossy().replace('\\', "/");
    let without_ext = normalized
        .trim_end_matches(".md")
        .trim_end_matches(".markdown");
    let trimmed = without_ext
        .strip_suffix("index")
        .unwrap_or(without_ext)
        .trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn blog_in(dir: &Path) -> Blog {
        Blog::with_config(dir.to_path_buf(), SiteConfig::default())
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_slug_for() {
        assert_eq!(slug_for(Path::new("react-hooks-1.md")).unwrap(), "/react-hooks-1");
        assert_eq!(slug_for(Path::new("2020/intro/index.md")).unwrap(), "/intro");
        assert_eq!(slug_for(Path::new("2020\\notes.md")).unwrap(), "/notes");
        assert!(slug_for(Path::new("index.md")).is_err());
    }

    #[test]
    fn test_slug_for_composes_hangul() {
        // 한글 spelled with conjoining jamo
        let decomposed = "\u{1112}\u{1161}\u{11AB}\u{1100}\u{1173}\u{11AF}.md";
        let slug = slug_for(Path::new(decomposed)).unwrap();
        assert_eq!(slug, "/\u{D55C}\u{AE00}");
        assert_eq!(slug.len(), 7);
    }

    #[test]
    fn test_page_path_for() {
        assert_eq!(page_path_for(Path::new("about.md")), "/about/");
        assert_eq!(page_path_for(Path::new("now/index.md")), "/now/");
        assert_eq!(page_path_for(Path::new("index.md")), "/");
    }

    #[test]
    fn test_load_posts() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog_in(dir.path());
        write(
            &blog.posts_dir.join("first.md"),
            "---\ntitle: First\ndate: 2020-01-01\ntags: [tip]\n---\nHello **there**.",
        );
        write(
            &blog.posts_dir.join("second/index.md"),
            "---\ntitle: Second\ndate: 2020-02-01\ndescription: desc\n---\n# Head\n\nBody",
        );
        write(
            &blog.posts_dir.join("wip.md"),
            "---\ntitle: WIP\ndate: 2020-03-01\ndraft: true\n---\n",
        );

        let loader = ContentLoader::new(&blog);
        let posts = loader.load_posts().unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["/second", "/first"]);

        let first = &posts[1];
        assert_eq!(first.title, "First");
        assert_eq!(first.tags, vec!["tip"]);
        assert_eq!(first.excerpt, "Hello there.");
        assert_eq!(first.description_or_excerpt(), "Hello there.");
        assert_eq!(posts[0].description_or_excerpt(), "desc");
        assert_eq!(posts[0].headings.len(), 1);
    }

    #[test]
    fn test_drafts_included_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut blog = blog_in(dir.path());
        blog.include_drafts = true;
        write(
            &blog.posts_dir.join("wip.md"),
            "---\ntitle: WIP\ndate: 2020-03-01\ndraft: true\n---\n",
        );
        let posts = ContentLoader::new(&blog).load_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].draft);
    }

    #[test]
    fn test_duplicate_slug_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog_in(dir.path());
        write(&blog.posts_dir.join("a/intro.md"), "---\ntitle: A\n---\n");
        write(&blog.posts_dir.join("b/intro/index.md"), "---\ntitle: B\n---\n");

        let err = ContentLoader::new(&blog).load_posts().unwrap_err();
        let err = err.downcast::<ContentError>().unwrap();
        assert!(matches!(err, ContentError::DuplicateSlug { ref slug, .. } if slug == "/intro"));
    }

    #[test]
    fn test_composed_and_decomposed_names_collide() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog_in(dir.path());
        write(&blog.posts_dir.join("a/\u{D55C}\u{AE00}.md"), "---\ntitle: A\n---\n");
        write(
            &blog.posts_dir.join("b/\u{1112}\u{1161}\u{11AB}\u{1100}\u{1173}\u{11AF}.md"),
            "---\ntitle: B\n---\n",
        );

        let err = ContentLoader::new(&blog).load_posts().unwrap_err();
        let err = err.downcast::<ContentError>().unwrap();
        assert!(matches!(err, ContentError::DuplicateSlug { ref slug, .. } if slug == "/\u{D55C}\u{AE00}"));
    }

    #[test]
    fn test_load_pages() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog_in(dir.path());
        write(&blog.pages_dir.join("about.md"), "---\ntitle: 소개\n---\n안녕하세요");
        let pages = ContentLoader::new(&blog).load_pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].path, "/about/");
        assert_eq!(pages[0].title, "소개");
        assert!(pages[0].html.contains("안녕하세요"));
    }
}
