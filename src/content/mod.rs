//! Content module - handles posts, pages, and content processing

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use markdown::{heading_id, youtube_id, Heading, MarkdownRenderer, Rendered};
pub use post::{sort_posts, time_to_read, Page, Post, WORDS_PER_MINUTE};
