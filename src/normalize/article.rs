use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A text field the API returns either bare or as `{"rendered": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RenderedText {
    Plain(String),
    Rich {
        #[serde(default)]
        rendered: Option<String>,
    },
}

impl RenderedText {
    /// The text regardless of representation
    pub fn into_text(self) -> String {
        match self {
            Self::Plain(text) => text,
            Self::Rich { rendered } => rendered.unwrap_or_default(),
        }
    }
}

/// The attributes of a raw WordPress post the normalizer reads
///
/// Everything else in the post object is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub id: Value,
    pub link: Option<String>,
    pub title: Option<RenderedText>,
    pub content: Option<RenderedText>,
    pub excerpt: Option<RenderedText>,
    pub date_gmt: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: Value,
}

impl RawPost {
    /// Href of the first featured-media link, if any
    pub fn featured_media_href(&self) -> Option<String> {
        self.links
            .get("wp:featuredmedia")?
            .get(0)?
            .get("href")?
            .as_str()
            .map(str::to_string)
    }
}

/// Provenance of a normalized article in the source system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub source_post_id: Value,
    pub source_post_type: Option<String>,
}

/// One article in the canonical cross-source format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedArticle {
    pub url: String,
    pub title: String,
    /// Body as Markdown
    pub article_text: String,
    /// Network location of `url`
    pub source_domain: String,
    /// Unix seconds of the collection run that captured the post
    pub first_seen_timestamp_gmt: i64,
    /// ISO-8601 with a trailing `Z`
    pub publication_date: Option<String>,
    pub publication_timestamp_gmt: Option<i64>,
    pub author: Option<String>,
    pub keywords: Vec<String>,
    pub image_url: Option<String>,
    pub excerpt: String,
    pub metadata: ArticleMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rendered_text_variants() {
        let plain: RenderedText = serde_json::from_value(json!("Hello")).unwrap();
        let rich: RenderedText =
            serde_json::from_value(json!({"rendered": "Hello", "protected": false})).unwrap();
        let empty: RenderedText = serde_json::from_value(json!({"raw": "x"})).unwrap();

        assert_eq!(plain.into_text(), "Hello");
        assert_eq!(rich.into_text(), "Hello");
        assert_eq!(empty.into_text(), "");
    }

    #[test]
    fn test_raw_post_reads_known_fields() {
        let raw = json!({
            "id": 42,
            "link": "https://example.com/post",
            "title": {"rendered": "T"},
            "type": "post",
            "categories": [1, 2],
            "_links": {"wp:featuredmedia": [{"embeddable": true, "href": "https://example.com/m/7"}]}
        });
        let post = RawPost::deserialize(&raw).unwrap();

        assert_eq!(post.id, json!(42));
        assert_eq!(post.post_type.as_deref(), Some("post"));
        assert!(post.content.is_none());
        assert_eq!(
            post.featured_media_href().as_deref(),
            Some("https://example.com/m/7")
        );
    }

    #[test]
    fn test_featured_media_absent() {
        let post = RawPost::deserialize(&json!({"_links": {"self": []}})).unwrap();
        assert_eq!(post.featured_media_href(), None);
        let post = RawPost::deserialize(&json!({"_links": {"wp:featuredmedia": []}})).unwrap();
        assert_eq!(post.featured_media_href(), None);
    }
}
