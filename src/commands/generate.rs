//! Generate static files

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use std::time::{Duration, Instant};

use crate::content::loader::ContentLoader;
use crate::generator::Generator;
use crate::Blog;

/// Load all content and render the site
pub fn run(blog: &Blog) -> Result<()> {
    let start = Instant::now();

    let loader = ContentLoader::new(blog);
    let posts = loader.load_posts()?;
    let pages = loader.load_pages()?;
    tracing::info!("Loaded {} posts and {} pages", posts.len(), pages.len());

    Generator::new(blog)?.generate(&posts, &pages)?;

    tracing::info!("Generated in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Watch contents and config, regenerating on change
pub async fn watch(blog: &Blog) -> Result<()> {
    let blog = blog.clone();
    tokio::task::spawn_blocking(move || watch_blocking(&blog)).await?
}

fn watch_blocking(blog: &Blog) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    let contents_dir = blog.base_dir.join(&blog.config.contents_dir);
    if contents_dir.exists() {
        debouncer
            .watcher()
            .watch(&contents_dir, RecursiveMode::Recursive)?;
    }
    let config_path = blog.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    for result in rx {
        match result {
            Ok(events) if !events.is_empty() => {
                tracing::info!("{} file(s) changed, regenerating...", events.len());
                let rebuilt = Blog::new(&blog.base_dir).and_then(|mut fresh| {
                    fresh.include_drafts = blog.include_drafts;
                    run(&fresh)
                });
                if let Err(e) = rebuilt {
                    tracing::error!("Generation failed: {:#}", e);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_run_generates_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Disk\ntag_groups:\n  category: { name: 카테고리 }\ntags:\n  tip: { name: 팁, group: category }\n",
        )
        .unwrap();
        let posts_dir = dir.path().join("contents/posts");
        fs::create_dir_all(&posts_dir).unwrap();
        fs::write(
            posts_dir.join("first-post.md"),
            "---\ntitle: First\ndate: 2020-07-01\ntags: [tip]\n---\n\n# Hello\n\nBody text.\n",
        )
        .unwrap();
        fs::write(
            posts_dir.join("hidden.md"),
            "---\ntitle: Hidden\ndate: 2020-07-02\ndraft: true\n---\n\nSecret\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        run(&blog).unwrap();

        let html = fs::read_to_string(blog.public_dir.join("first-post/index.html")).unwrap();
        assert!(html.contains("First | Disk"));
        assert!(blog.public_dir.join("tags/tip/index.html").exists());
        assert!(!blog.public_dir.join("hidden/index.html").exists());

        let mut drafts = blog.clone();
        drafts.include_drafts = true;
        run(&drafts).unwrap();
        assert!(blog.public_dir.join("hidden/index.html").exists());
    }
}
