use htmd::options::{HeadingStyle, Options};
use htmd::HtmlToMarkdown;
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;

fn paragraph_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\n{2,}\s*").expect("valid paragraph-break pattern"))
}

/// Converts rendered post HTML to Markdown with `#`-style headings
///
/// Runs of blank lines (and the whitespace around them) collapse to a single
/// paragraph break and the result is trimmed. If the converter fails, the
/// plain text of the fragment is used instead.
pub fn html_to_markdown(html: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            ..Default::default()
        })
        .build();

    let markdown = converter.convert(html).unwrap_or_else(|e| {
        tracing::debug!("Markdown conversion failed, using plain text: {}", e);
        Html::parse_fragment(html).root_element().text().collect::<String>()
    });

    normalize_whitespace(&markdown)
}

/// Collapses paragraph breaks to exactly `\n\n` and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    paragraph_breaks().replace_all(text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_use_atx() {
        let markdown = html_to_markdown("<h2>Section</h2><p>Body text.</p>");
        assert!(markdown.starts_with("## Section"));
        assert!(markdown.ends_with("Body text."));
    }

    #[test]
    fn test_paragraphs_separated_by_one_blank_line() {
        let markdown = html_to_markdown("<p>One</p>\n\n\n<p>Two</p>");
        assert_eq!(markdown, "One\n\nTwo");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\n\n\t b  "), "a\n\nb");
        assert_eq!(normalize_whitespace("a\nb"), "a\nb");
        assert_eq!(normalize_whitespace("\n\n"), "");
    }

    #[test]
    fn test_empty_html() {
        assert_eq!(html_to_markdown(""), "");
    }
}
