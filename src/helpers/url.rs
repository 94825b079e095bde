//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters left unescaped by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Generate a site-relative URL with a leading slash
///
/// # Examples
/// ```ignore
/// url_for("css/style.css") // -> "/css/style.css"
/// ```
pub fn url_for(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about/") // -> "https://example.com/about/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    format!("{}{}", config.base_url(), url_for(path))
}

/// Percent-encode a URI component
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// Twitter share dialog
pub fn twitter_share_url(message: &str, url: &str) -> String {
    format!(
        "https://twitter.com/share?text={}&url={}",
        encode_component(message),
        encode_component(url)
    )
}

/// Facebook share dialog
pub fn facebook_share_url(app_id: &str, url: &str) -> String {
    format!(
        "https://www.facebook.com/dialog/share?app_id={}&display=popup&href={}",
        encode_component(app_id),
        encode_component(url)
    )
}

/// `mailto:` link with subject and body
pub fn mail_share_url(message: &str, url: &str) -> String {
    format!(
        "mailto:?&subject={}&body={}",
        encode_component(message),
        encode_component(url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            site_url: "https://blog.example.com/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_for() {
        assert_eq!(url_for("/css/style.css"), "/css/style.css");
        assert_eq!(url_for("about/"), "/about/");
        assert_eq!(url_for(""), "/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/about/"),
            "https://blog.example.com/about/"
        );
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("a b&c"), "a%20b%26c");
        assert_eq!(encode_component("it's (ok)"), "it's%20(ok)");
        assert_eq!(encode_component("강의"), "%EA%B0%95%EC%9D%98");
    }

    #[test]
    fn test_share_urls() {
        let url = "https://blog.example.com/post/";
        assert_eq!(
            twitter_share_url("Hi there", url),
            "https://twitter.com/share?text=Hi%20there&url=https%3A%2F%2Fblog.example.com%2Fpost%2F"
        );
        assert!(facebook_share_url("123", url).starts_with(
            "https://www.facebook.com/dialog/share?app_id=123&display=popup&href=https%3A"
        ));
        assert!(mail_share_url("Hi", url).starts_with("mailto:?&subject=Hi&body="));
    }
}
