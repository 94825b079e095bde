//! Search post titles from the command line

use anyhow::Result;

use crate::content::loader::ContentLoader;
use crate::search::{SearchEntry, SearchIndex};
use crate::Blog;

/// Print posts whose title matches every term of `query`
pub fn run(blog: &Blog, query: &str) -> Result<()> {
    let entries = search(blog, query)?;
    println!("{}개의 결과", entries.len());
    for entry in entries {
        println!("  {} {} - {}", entry.date, entry.slug, entry.title);
    }
    Ok(())
}

fn search(blog: &Blog, query: &str) -> Result<Vec<SearchEntry>> {
    let posts = ContentLoader::new(blog).load_posts()?;
    let index = SearchIndex::build(&posts, blog.config.search_excerpt_length);
    Ok(index.search(query).into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;

    #[test]
    fn test_search_loaded_posts() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default());
        fs::create_dir_all(&blog.posts_dir).unwrap();
        fs::write(
            blog.posts_dir.join("a.md"),
            "---\ntitle: Svelte 시작하기\ndate: 2020-01-01\n---\n\nbody\n",
        )
        .unwrap();
        fs::write(
            blog.posts_dir.join("b.md"),
            "---\ntitle: React 시작하기\ndate: 2020-01-02\n---\n\nbody\n",
        )
        .unwrap();

        let slugs: Vec<String> = search(&blog, "시작하기")
            .unwrap()
            .into_iter()
            .map(|e| e.slug)
            .collect();
        assert_eq!(slugs, vec!["/b", "/a"]);
        assert_eq!(search(&blog, "svelte").unwrap().len(), 1);
        assert!(search(&blog, "").unwrap().is_empty());
    }
}
