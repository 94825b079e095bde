//! Built-in theme templates using the Tera template engine
//!
//! Templates and the stylesheet are embedded in the binary. Autoescaping is
//! off; view structs carry text that is already escaped.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Stylesheet written to `css/style.css`
pub const STYLESHEET: &str = include_str!("theme/style.css");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("macros.html", include_str!("theme/macros.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("page.html", include_str!("theme/page.html")),
            ("portfolio.html", include_str!("theme/portfolio.html")),
            ("search.html", include_str!("theme/search.html")),
            ("404.html", include_str!("theme/404.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub author: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub analytics_id: Option<String>,
    pub year: i32,
    pub menu: Vec<MenuItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub name: String,
    pub path: String,
}

/// SEO metadata of the page being rendered
#[derive(Debug, Clone, Serialize)]
pub struct MetaData {
    /// Content of `<title>`
    pub title: String,
    pub og_title: String,
    pub description: String,
    pub image: String,
    pub url: String,
    pub path: String,
    /// Excluded from analytics
    pub excluded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagView {
    pub slug: String,
    pub name: String,
    pub color: String,
    pub count: usize,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub slug: String,
    pub name: String,
    pub color: String,
    pub tags: Vec<TagView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub path: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub time_to_read: usize,
    pub thumbnail: Option<String>,
    pub tags: Vec<TagView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefView {
    pub path: String,
    pub title: String,
    pub date: String,
    pub current: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareLinks {
    pub twitter: String,
    pub facebook: Option<String>,
    pub mail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub description: String,
    pub html: String,
    pub toc: String,
    pub url: String,
    pub tags: Vec<TagView>,
    pub date_formal: String,
    pub date_long: String,
    pub date_from_now: String,
    pub time_to_read: usize,
    pub share: ShareLinks,
    pub parts: Vec<RefView>,
    pub category: Vec<RefView>,
    pub related: Vec<RefView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioView {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub image: Option<String>,
    pub date: Option<String>,
    pub tags: Vec<TagView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub title: String,
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        assert!(TemplateRenderer::new().is_ok());
    }
}
