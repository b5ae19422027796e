//! Deterministic cache-key derivation.

use md5::{Digest, Md5};

/// Keys longer than this (in bytes) collapse to `prefix:<md5 hex>`.
pub const MAX_KEY_LEN: usize = 250;

/// The request dimensions a cache key is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyParts {
    pub prefix: String,
    pub path: String,
    pub user_id: Option<String>,
    pub query: Option<String>,
    /// Selected headers, in policy order.
    pub headers: Vec<(String, String)>,
}

/// Build `prefix:path[:user:<id>][:query:<raw>][:header:<name>:<value>]*`.
pub fn derive_key(parts: &KeyParts) -> String {
    let mut segments: Vec<String> = vec![parts.prefix.clone(), parts.path.clone()];

    if let Some(user_id) = parts.user_id.as_deref().filter(|u| !u.is_empty()) {
        segments.push(format!("user:{user_id}"));
    }
    if let Some(query) = parts.query.as_deref().filter(|q| !q.is_empty()) {
        segments.push(format!("query:{query}"));
    }
    for (name, value) in &parts.headers {
        if !value.is_empty() {
            segments.push(format!("header:{name}:{value}"));
        }
    }

    let key = segments.join(":");
    if key.len() <= MAX_KEY_LEN {
        return key;
    }
    format!("{}:{}", parts.prefix, hex::encode(Md5::digest(key.as_bytes())))
}
