use crate::normalize::article::{ArticleMetadata, NormalizedArticle, RawPost};
use crate::normalize::markdown::html_to_markdown;
use crate::normalize::NormalizationError;
use crate::url::extract_domain;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

/// How a post is named in error messages: its link, else `ID: <id>`
pub fn article_identifier(raw: &Value) -> String {
    if let Some(link) = raw.get("link").and_then(Value::as_str) {
        if !link.is_empty() {
            return link.to_string();
        }
    }

    match raw.get("id") {
        Some(Value::String(id)) => format!("ID: {}", id),
        Some(Value::Null) | None => "ID: N/A".to_string(),
        Some(id) => format!("ID: {}", id),
    }
}

/// Normalizes one raw WordPress post into the canonical article format
///
/// # Arguments
///
/// * `raw` - The post exactly as the API returned it
/// * `collection_timestamp` - Unix seconds of the run that captured the post
///
/// # Returns
///
/// * `Ok(NormalizedArticle)` - All required fields were present
/// * `Err(NormalizationError)` - A required field is missing or empty, or the
///   post has an unusable shape
pub fn normalize_post(
    raw: &Value,
    collection_timestamp: i64,
) -> Result<NormalizedArticle, NormalizationError> {
    let article = article_identifier(raw);
    let post = RawPost::deserialize(raw).map_err(|e| NormalizationError::InvalidShape {
        article: article.clone(),
        message: e.to_string(),
    })?;

    let missing = |field: &'static str| NormalizationError::MissingField {
        field,
        article: article.clone(),
    };

    let url = post
        .link
        .clone()
        .filter(|link| !link.is_empty())
        .ok_or_else(|| missing("link"))?;
    let title = post
        .title
        .clone()
        .map(|t| t.into_text())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| missing("title"))?;
    let article_text = post
        .content
        .clone()
        .map(|c| html_to_markdown(&c.into_text()))
        .filter(|text| !text.is_empty())
        .ok_or_else(|| missing("content"))?;
    let source_domain = extract_domain(&url).ok_or_else(|| missing("source_domain"))?;
    if collection_timestamp == 0 {
        return Err(missing("collection_timestamp"));
    }

    let publication_date = post
        .date_gmt
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| format!("{}Z", d));
    let publication_timestamp_gmt = publication_date.as_deref().and_then(parse_utc_timestamp);

    let excerpt = post
        .excerpt
        .clone()
        .map(|e| e.into_text())
        .filter(|e| !e.is_empty())
        .map(|e| html_to_markdown(&e))
        .unwrap_or_default();

    Ok(NormalizedArticle {
        image_url: post.featured_media_href(),
        url,
        title,
        article_text,
        source_domain,
        first_seen_timestamp_gmt: collection_timestamp,
        publication_date,
        publication_timestamp_gmt,
        author: None,
        keywords: Vec::new(),
        excerpt,
        metadata: ArticleMetadata {
            source_post_id: post.id,
            source_post_type: post.post_type,
        },
    })
}

/// Parses a `date_gmt + "Z"` string to Unix seconds
///
/// WordPress `date_gmt` has no offset, so it is read as UTC. Strings that
/// already carried an offset are accepted through RFC 3339.
fn parse_utc_timestamp(date: &str) -> Option<i64> {
    let naive = date.strip_suffix('Z').unwrap_or(date);
    if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc().timestamp());
    }

    DateTime::parse_from_rfc3339(date)
        .or_else(|_| DateTime::parse_from_rfc3339(naive))
        .map(|dt| dt.timestamp())
        .ok()
}
