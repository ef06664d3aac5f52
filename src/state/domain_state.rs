use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Collection status of a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    /// No page of this domain has been handled yet
    #[default]
    Pending,
    /// At least one page was fetched and parsed
    Success,
    /// The last handled page failed
    Error,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the deduplication key for a raw post
///
/// Posts whose `id` is missing, null, zero, `false` or an empty string carry no
/// usable identity and yield `None`. Numbers and strings keep distinct keys
/// (`5` and `"5"` differ) because the key is the JSON rendering of the value.
pub fn post_id_key(post: &Value) -> Option<String> {
    let id = post.get("id")?;
    let usable = match id {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    };
    usable.then(|| id.to_string())
}

/// How one fetched page was absorbed into a domain's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageOutcome {
    /// The page number that was absorbed
    pub page: u32,
    /// Posts whose identifier had not been seen before
    pub new_count: usize,
    /// Posts whose identifier was already stored
    pub duplicate_count: usize,
    /// Posts dropped because they carry no identifier
    pub unidentified_count: usize,
}

impl PageOutcome {
    /// Decides whether the next page of this domain should be requested
    ///
    /// Only an exactly-full page of entirely new posts signals that more may
    /// exist. Any duplicate means the listing has wrapped into content already
    /// stored, and `max_pages` caps the per-domain cost.
    pub fn warrants_next_page(&self, page_size: u32, max_pages: u32) -> bool {
        self.new_count == page_size as usize
            && self.duplicate_count == 0
            // next page = page + 1, which must stay within the cap
            && self.page < max_pages
    }
}

/// Tracks the collection state of one domain during a run
///
/// Posts are kept as the raw JSON values the API returned, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Accumulated unique posts
    pub posts: Vec<Value>,

    /// Identifiers of every stored post; only ever grows
    seen_post_ids: HashSet<String>,

    /// Number of the last page successfully absorbed
    pub pages_fetched: u32,

    /// Current status
    pub status: DomainStatus,

    /// Message of the last recorded failure
    pub error_message: Option<String>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs one page of posts, keeping only those with unseen identifiers
    pub fn absorb_page(&mut self, page: u32, posts: Vec<Value>) -> PageOutcome {
        let mut outcome = PageOutcome {
            page,
            ..PageOutcome::default()
        };

        for post in posts {
            match post_id_key(&post) {
                Some(key) => {
                    if self.seen_post_ids.insert(key) {
                        self.posts.push(post);
                        outcome.new_count += 1;
                    } else {
                        outcome.duplicate_count += 1;
                    }
                }
                None => outcome.unidentified_count += 1,
            }
        }

        self.pages_fetched = self.pages_fetched.max(page);
        self.status = DomainStatus::Success;
        outcome
    }

    /// Records a failure for this domain
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = DomainStatus::Error;
        self.error_message = Some(message.into());
    }

    /// Returns true if an identifier has already been stored
    #[cfg(test)]
    pub fn has_seen(&self, key: &str) -> bool {
        self.seen_post_ids.contains(key)
    }

    /// Number of distinct identifiers stored so far
    #[cfg(test)]
    pub fn seen_count(&self) -> usize {
        self.seen_post_ids.len()
    }

    pub fn article_count(&self) -> usize {
        self.posts.len()
    }

    /// A domain that produced nothing without failing needs the diagnostic probe
    pub fn needs_diagnosis(&self) -> bool {
        self.posts.is_empty() && self.error_message.is_none()
    }
}
