//! Cache module for storing API responses
//!
//! This module provides a namespaced cache on top of the key-value store.
//! Entries expire after a fixed window and each namespace is capped, with the
//! oldest entry evicted on overflow.

mod store;

pub use store::{CacheConfig, CacheStore};
