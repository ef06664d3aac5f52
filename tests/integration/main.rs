//! Integration tests for wp-harvest
//!
//! These tests use wiremock servers as stand-in WordPress sites and run the
//! collector and normalizer end-to-end against a temporary directory.

mod collect_tests;
mod normalize_tests;
