//! Markdown rendering with syntax highlighting, heading anchors and video embeds

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashMap;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::helpers::html_escape;

const YOUTUBE_EMBED: &str = "https://www.youtube-nocookie.com/embed/";

/// A heading collected while rendering, used for the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: usize,
    pub id: String,
    pub text: String,
}

/// Output of a markdown render
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub headings: Vec<Heading>,
    /// Whitespace-collapsed text outside code blocks
    pub text: String,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("InspiredGitHub", true)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<Rendered> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut headings = Vec::new();
        let mut used_ids: HashMap<String, usize> = HashMap::new();
        let mut text = String::new();

        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        let mut heading: Option<(usize, Option<String>, Vec<Event>)> = None;

        for event in parser {
            if in_code_block {
                match event {
                    Event::End(TagEnd::CodeBlock) => {
                        let highlighted =
                            self.highlight_code(&code_block_content, code_block_lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                        in_code_block = false;
                        code_block_lang = None;
                    }
                    Event::Text(text) => code_block_content.push_str(&text),
                    _ => {}
                }
                continue;
            }

            match &event {
                Event::Text(t) => text.push_str(t),
                Event::Code(t) if !t.trim_start().starts_with("youtube:") => text.push_str(t),
                Event::SoftBreak
                | Event::HardBreak
                | Event::End(
                    TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::TableCell,
                ) => text.push(' '),
                _ => {}
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_content.clear();
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => lang
                            .split_whitespace()
                            .next()
                            .map(str::to_string)
                            .filter(|l| !l.is_empty()),
                        CodeBlockKind::Indented => None,
                    };
                }
                Event::Start(Tag::Heading { level, id, .. }) => {
                    heading = Some((level as usize, id.map(|i| i.to_string()), Vec::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, id, inner)) = heading.take() {
                        let text = plain_text(&inner);
                        let base = id.unwrap_or_else(|| heading_id(&text));
                        let id = unique_id(base, &mut used_ids);

                        let mut inner_html = String::new();
                        html::push_html(&mut inner_html, inner.into_iter());

                        events.push(Event::Html(CowStr::from(format!(
                            "<h{level} id=\"{id}\"><a class=\"anchor\" href=\"#{id}\" aria-hidden=\"true\">#</a>{inner_html}</h{level}>\n"
                        ))));
                        headings.push(Heading { level, id, text });
                    }
                }
                Event::Code(code) if code.trim_start().starts_with("youtube:") => {
                    let event = match youtube_embed(&code) {
                        Some(embed) => Event::Html(CowStr::from(embed)),
                        None => Event::Code(code),
                    };
                    push_event(&mut heading, &mut events, event);
                }
                other => push_event(&mut heading, &mut events, other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(Rendered {
            html: html_output,
            headings,
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
        })
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let Some(theme) = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
        else {
            return plain_code_block(code, lang);
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let highlighted = highlighter
                .highlight_line(line, &self.syntax_set)
                .and_then(|regions| {
                    styled_line_to_highlighted_html(&regions[..], IncludeBackground::No)
                });
            match highlighted {
                Ok(html) => lines.push(html.trim_end_matches('\n').to_string()),
                Err(e) => {
                    tracing::debug!("Highlighting failed for {}: {}", lang, e);
                    return plain_code_block(code, lang);
                }
            }
        }

        if self.line_numbers {
            add_line_numbers(&lines, lang)
        } else {
            format!(
                r#"<pre class="language-{lang}"><code class="language-{lang}">{}</code></pre>"#,
                lines.join("\n")
            )
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn push_event<'a>(
    heading: &mut Option<(usize, Option<String>, Vec<Event<'a>>)>,
    events: &mut Vec<Event<'a>>,
    event: Event<'a>,
) {
    match heading {
        Some((_, _, inner)) => inner.push(event),
        None => events.push(event),
    }
}

fn plain_code_block(code: &str, lang: &str) -> String {
    format!(
        r#"<pre class="language-{lang}"><code class="language-{lang}">{}</code></pre>"#,
        html_escape(code)
    )
}

fn add_line_numbers(lines: &[String], lang: &str) -> String {
    let mut body = String::new();
    for (i, line) in lines.iter().enumerate() {
        body.push_str(&format!(
            r#"<span class="line"><span class="line-number">{}</span>{}</span>"#,
            i + 1,
            line
        ));
        if i + 1 < lines.len() {
            body.push('\n');
        }
    }
    format!(
        r#"<pre class="language-{lang} line-numbers"><code class="language-{lang}">{body}</code></pre>"#
    )
}

/// Concatenated text of inline events
fn plain_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}

/// Anchor id for a heading; keeps non-ASCII letters so Korean headings stay readable
pub fn heading_id(text: &str) -> String {
    let mut id = String::new();
    let mut dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            id.extend(c.to_lowercase());
            dash = false;
        } else if !dash && !id.is_empty() {
            id.push('-');
            dash = true;
        }
    }
    let id = id.trim_end_matches('-').to_string();
    if id.is_empty() {
        "section".to_string()
    } else {
        id
    }
}

fn unique_id(base: String, used: &mut HashMap<String, usize>) -> String {
    let count = used.entry(base.clone()).or_insert(0);
    let id = if *count == 0 {
        base
    } else {
        format!("{}-{}", base, count)
    };
    *count += 1;
    id
}

/// Extract a YouTube video id from `youtube: <id or url>`
pub fn youtube_id(code: &str) -> Option<String> {
    let value = code.trim().strip_prefix("youtube:")?.trim();
    let id = if let Some(pos) = value.find("v=") {
        value[pos + 2..].split(['&', '#']).next()?
    } else if let Some(pos) = value.find("youtu.be/") {
        value[pos + 9..].split(['?', '&', '#']).next()?
    } else if let Some(pos) = value.find("/embed/") {
        value[pos + 7..].split(['?', '&', '#']).next()?
    } else {
        value
    };

    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| id.to_string())
}

fn youtube_embed(code: &str) -> Option<String> {
    let id = youtube_id(code)?;
    Some(format!(
        r#"<span class="embed-video"><iframe src="{}{}?rel=0" width="800" height="450" frameborder="0" allow="autoplay; encrypted-media; picture-in-picture" allowfullscreen></iframe></span>"#,
        YOUTUBE_EMBED, id
    ))
}
