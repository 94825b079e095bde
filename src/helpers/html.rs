//! HTML helper functions

use crate::content::Heading;

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Prune text to at most `length` characters at a word boundary, appending `…`
///
/// Whitespace is collapsed first. A single word longer than `length` is cut.
pub fn prune(text: &str, length: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= length {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(length).collect();
    let next_is_space = collapsed
        .chars()
        .nth(length)
        .map(char::is_whitespace)
        .unwrap_or(true);

    let kept = if next_is_space {
        cut.as_str()
    } else {
        match cut.rfind(' ') {
            Some(pos) if pos > 0 => &cut[..pos],
            _ => cut.as_str(),
        }
    };

    format!(
        "{}…",
        kept.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
    )
}

/// Nested table of contents from collected headings
///
/// Levels deeper than `max_depth` are skipped; the shallowest level present
/// becomes the top of the list.
pub fn toc(headings: &[Heading], max_depth: usize) -> String {
    let items: Vec<&Heading> = headings.iter().filter(|h| h.level <= max_depth).collect();
    let Some(base) = items.iter().map(|h| h.level).min() else {
        return String::new();
    };

    let mut html = String::from(r#"<ol class="toc">"#);
    let mut depth = base;
    let mut open_item = false;

    for heading in items {
        if heading.level > depth {
            while depth < heading.level {
                html.push_str("<ol>");
                depth += 1;
                open_item = false;
            }
        } else {
            if open_item {
                html.push_str("</li>");
            }
            while depth > heading.level {
                html.push_str("</ol></li>");
                depth -= 1;
            }
        }

        html.push_str(&format!(
            r##"<li class="toc-item toc-level-{}"><a class="toc-link" href="#{}">{}</a>"##,
            heading.level,
            heading.id,
            html_escape(&heading.text)
        ));
        open_item = true;
    }

    if open_item {
        html.push_str("</li>");
    }
    while depth > base {
        html.push_str("</ol></li>");
        depth -= 1;
    }
    html.push_str("</ol>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(level: usize, id: &str) -> Heading {
        Heading {
            level,
            id: id.to_string(),
            text: id.to_uppercase(),
        }
    }

    #[test]
    fn test_prune() {
        assert_eq!(prune("short text", 20), "short text");
        assert_eq!(prune("hello wonderful world", 12), "hello…");
        assert_eq!(prune("hello world again", 11), "hello world…");
        assert_eq!(prune("abcdefghij", 4), "abcd…");
        assert_eq!(prune("  spaced\n\nout  ", 20), "spaced out");
        assert_eq!(prune("가나다 라마바 사아자", 6), "가나다…");
    }

    #[test]
    fn test_toc_nesting() {
        let html = toc(&[h(2, "a"), h(3, "b"), h(3, "c"), h(2, "d"), h(4, "skip")], 3);
        assert_eq!(
            html,
            concat!(
                r#"<ol class="toc">"#,
                r##"<li class="toc-item toc-level-2"><a class="toc-link" href="#a">A</a>"##,
                "<ol>",
                r##"<li class="toc-item toc-level-3"><a class="toc-link" href="#b">B</a></li>"##,
                r##"<li class="toc-item toc-level-3"><a class="toc-link" href="#c">C</a>"##,
                "</li></ol></li>",
                r##"<li class="toc-item toc-level-2"><a class="toc-link" href="#d">D</a></li>"##,
                "</ol>"
            )
        );
    }

    #[test]
    fn test_toc_empty() {
        assert_eq!(toc(&[], 3), "");
        assert_eq!(toc(&[h(4, "deep")], 3), "");
    }

}
