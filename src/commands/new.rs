//! Create a new post

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::content::loader::slug_for;
use crate::Blog;

/// Create `<posts_dir>/<slug>.md` with a front-matter scaffold
///
/// The slug defaults to the slugified title. Fails if the file exists.
pub fn create_post(blog: &Blog, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = match slug {
        Some(s) => s.trim().trim_matches('/').to_string(),
        None => slug::slugify(title),
    };
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a slug from {:?}, pass --slug", title);
    }

    let file_path = blog.posts_dir.join(format!("{}.md", slug));
    // Reject names the loader could not turn back into a slug
    slug_for(&PathBuf::from(format!("{}.md", slug)))?;

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    fs::create_dir_all(&blog.posts_dir)?;

    let now = chrono::Utc::now().with_timezone(&blog.config.tz());
    let content = format!(
        "---\ntitle: {}\ndate: {}\ndescription: ''\ntags: []\ndraft: true\n---\n\n",
        serde_yaml::to_string(title)?.trim_end(),
        now.format("%Y-%m-%d %H:%M:%S")
    );

    fs::write(&file_path, content).with_context(|| format!("Failed to write {:?}", file_path))?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::FrontMatter;

    fn blog(dir: &std::path::Path) -> Blog {
        Blog::with_config(dir.to_path_buf(), SiteConfig::default())
    }

    #[test]
    fn test_create_post_with_slugified_title() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        let path = blog.new_post("React Hooks: Part 1", None).unwrap();
        assert_eq!(path, blog.posts_dir.join("react-hooks-part-1.md"));

        let content = fs::read_to_string(&path).unwrap();
        let (fm, _) = FrontMatter::parse(&content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("React Hooks: Part 1"));
        assert!(fm.draft);
        assert!(fm.parse_date(&blog.config.tz()).is_some());
    }

    #[test]
    fn test_create_post_with_explicit_slug_and_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        let path = blog.new_post("리액트 훅 입문", Some("react-hooks-1")).unwrap();
        assert!(path.ends_with("react-hooks-1.md"));
        assert!(blog.new_post("again", Some("react-hooks-1")).is_err());
    }
}
