//! State module for tracking collection progress
//!
//! # Components
//!
//! - `DomainState`: accumulated posts, seen identifiers and status for one domain
//! - `DomainStatus`: pending / success / error
//! - `PageOutcome`: how one fetched page was absorbed, and whether to fetch the next

mod domain_state;

// Re-export main types
pub use domain_state::{post_id_key, DomainState, DomainStatus, PageOutcome};
