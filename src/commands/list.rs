//! List site content

use anyhow::Result;

use crate::content::loader::ContentLoader;
use crate::helpers::date_formal;
use crate::relations::Relations;
use crate::taxonomy::Taxonomy;
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    for line in lines(blog, content_type)? {
        println!("{}", line);
    }
    Ok(())
}

fn lines(blog: &Blog, content_type: &str) -> Result<Vec<String>> {
    let loader = ContentLoader::new(blog);
    let mut out = Vec::new();

    match content_type {
        "post" | "posts" => {
            let posts = loader.load_posts()?;
            out.push(format!("Posts ({}):", posts.len()));
            for post in &posts {
                out.push(format!(
                    "  {} {} - {} [{}]",
                    date_formal(&post.date),
                    post.slug,
                    post.title,
                    post.tags.join(", ")
                ));
            }
        }
        "page" | "pages" => {
            let pages = loader.load_pages()?;
            out.push(format!("Pages ({}):", pages.len()));
            for page in &pages {
                out.push(format!("  {} - {}", page.path, page.title));
            }
        }
        "tag" | "tags" => {
            let posts = loader.load_posts()?;
            let taxonomy = Taxonomy::build(&blog.config, &posts);
            let tags: Vec<_> = taxonomy.tags().collect();
            out.push(format!("Tags ({}):", tags.len()));
            for tag in tags {
                out.push(format!("  {} ({}) {} [{}]", tag.slug, tag.count, tag.name, tag.group));
            }
        }
        "group" | "groups" => {
            let taxonomy = Taxonomy::build(&blog.config, &[]);
            out.push(format!("Tag groups ({}):", taxonomy.groups().len()));
            for group in taxonomy.groups() {
                let slugs: Vec<&str> = group.tags.iter().map(|t| t.slug.as_str()).collect();
                out.push(format!(
                    "  {} - {} ({}): {}",
                    group.slug,
                    group.name,
                    group.color,
                    slugs.join(", ")
                ));
            }
        }
        "series" => {
            let posts = loader.load_posts()?;
            let taxonomy = Taxonomy::build(&blog.config, &posts);
            let relations = Relations::derive(&posts, &taxonomy, &blog.config.relations);
            let series = relations.series();
            out.push(format!("Series ({}):", series.len()));
            for (name, parts) in series {
                out.push(format!("  {} ({} parts)", name, parts.len()));
                for part in parts {
                    out.push(format!("    {} - {}", part.slug, part.title));
                }
            }
        }
        "portfolio" | "portfolios" => {
            let taxonomy = Taxonomy::build(&blog.config, &[]);
            out.push(format!("Portfolios ({}):", taxonomy.portfolios().len()));
            for item in taxonomy.portfolios() {
                let date = item.date.as_ref().map(date_formal).unwrap_or_default();
                out.push(format!("  {} {} - {}", date, item.slug, item.title));
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, tag, group, series, portfolio",
                content_type
            );
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> (tempfile::TempDir, Blog) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            r#"
tag_groups:
  category: { name: 카테고리, color: red }
tags:
  lecture: { name: 강의, group: category }
portfolios:
  - { slug: app, title: App, date: "2021-01-02" }
"#,
        )
        .unwrap();
        let posts_dir = dir.path().join("contents/posts");
        fs::create_dir_all(&posts_dir).unwrap();
        for (name, day) in [("hooks-1", 1), ("hooks-2", 2), ("solo", 3)] {
            fs::write(
                posts_dir.join(format!("{}.md", name)),
                format!("---\ntitle: {}\ndate: 2020-01-0{}\ntags: [lecture]\n---\n\nbody\n", name, day),
            )
            .unwrap();
        }
        let blog = Blog::new(dir.path()).unwrap();
        (dir, blog)
    }

    #[test]
    fn test_list_posts_and_tags() {
        let (_dir, blog) = site();
        let posts = lines(&blog, "post").unwrap();
        assert_eq!(posts[0], "Posts (3):");
        assert!(posts[1].contains("/solo"));

        let tags = lines(&blog, "tags").unwrap();
        assert_eq!(tags[1], "  lecture (3) 강의 [category]");
    }

    #[test]
    fn test_list_series_groups_and_portfolios() {
        let (_dir, blog) = site();
        let series = lines(&blog, "series").unwrap();
        assert_eq!(
            series,
            vec![
                "Series (1):",
                "  hooks (2 parts)",
                "    /hooks-1 - hooks-1",
                "    /hooks-2 - hooks-2",
            ]
        );

        let groups = lines(&blog, "group").unwrap();
        assert_eq!(groups[1], "  category - 카테고리 (red): lecture");

        let portfolios = lines(&blog, "portfolio").unwrap();
        assert_eq!(portfolios[1], "  2021-01-02 app - App");
    }

    #[test]
    fn test_list_unknown_type() {
        let (_dir, blog) = site();
        assert!(lines(&blog, "category").is_err());
    }
}
