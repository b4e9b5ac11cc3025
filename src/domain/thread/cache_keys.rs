//! Cache key layout for thread reads.

use sha2::{Digest, Sha256};

use super::ThreadListQuery;
use crate::domain::foundation::ThreadId;

/// Prefix shared by every cached listing page.
pub const THREAD_LIST_PREFIX: &str = "threads:list:";

pub fn thread(id: &ThreadId) -> String {
    format!("thread:{}", id)
}

pub fn thread_slug(slug: &str) -> String {
    format!("thread:slug:{}", slug)
}

/// `threads:list:<hash>` where the hash is SHA-256 over the query's JSON form.
pub fn thread_list(query: &ThreadListQuery) -> String {
    // Serializing a plain struct of scalars cannot fail.
    let canonical = serde_json::to_vec(query).unwrap_or_default();
    format!("{}{}", THREAD_LIST_PREFIX, hex::encode(Sha256::digest(&canonical)))
}

pub fn thread_summary(id: &ThreadId) -> String {
    format!("thread:summary:{}", id)
}
