//! Initialize a new taglog site

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# taglog configuration

# Site
title: My Blog
author: Anonymous
description: ''
site_url: http://localhost:4000
language: ko
timezone: Asia/Seoul
# google_analytics_tracking_id: UA-XXXXXXXXX-X
# facebook_app_id: ''

# Directory
contents_dir: contents
posts_dir: posts
pages_dir: pages
images_dir: images
public_dir: public

# Writing
excerpt_length: 180
toc_max_depth: 3
highlight:
  theme: InspiredGitHub
  line_number: true

# Relations between posts
relations:
  category_group: category
  related_limit: 5
  min_parts: 2

# Sitemap
sitemap:
  exclude:
    - /search/

# Tag groups: color is one of gray, red, pink, grape, violet, indigo,
# blue, cyan, teal, green, lime, yellow, orange
tag_groups:
  category: { name: 카테고리, color: red }
  proglang: { name: 프로그래밍 언어, color: blue }
  framework: { name: 프레임워크, color: violet }

# Tags: posts refer to these slugs in their front-matter
tags:
  lecture: { name: 강의, group: category }
  tip: { name: 팁, group: category }
  javascript: { name: JavaScript, group: proglang }
  python: { name: Python, group: proglang }
  rust: { name: Rust, group: proglang }
  react: { name: React, group: framework }

portfolios: []
"#;

const ABOUT_PAGE: &str = r#"---
title: 소개
---

이 블로그를 소개합니다.
"#;

/// Initialize a new site in the given directory
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    for dir in ["contents/posts", "contents/pages", "contents/images"] {
        fs::create_dir_all(target_dir.join(dir))
            .with_context(|| format!("Failed to create {}", dir))?;
    }

    let today = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let hello = format!(
        r#"---
title: Hello World
date: {}
description: taglog로 작성한 첫 번째 포스트
tags: [tip]
---

taglog에 오신 것을 환영합니다!

## 포스트 작성

```bash
$ taglog new "새 포스트" --slug my-new-post
```

## 미리 보기

```bash
$ taglog server
```

## 생성

```bash
$ taglog generate
```
"#,
        today
    );

    write_if_missing(&target_dir.join("_config.yml"), CONFIG_TEMPLATE)?;
    write_if_missing(&target_dir.join("contents/posts/hello-world.md"), &hello)?;
    write_if_missing(&target_dir.join("contents/pages/about.md"), ABOUT_PAGE)?;

    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("{:?} already exists, skipping", path);
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::Blog;

    #[test]
    fn test_init_creates_loadable_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        let config = SiteConfig::load(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.tag_groups.len(), 3);
        assert_eq!(config.tags["rust"].group, "proglang");

        let blog = Blog::new(dir.path()).unwrap();
        assert!(blog.posts_dir.join("hello-world.md").exists());
        assert!(blog.pages_dir.join("about.md").exists());
        assert!(blog.images_dir.is_dir());
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Mine\n").unwrap();
        init_site(dir.path()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("_config.yml")).unwrap(),
            "title: Mine\n"
        );
    }
}
