use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cache::store::CacheError;

/// A captured response, written once on a miss and replayed on hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
    pub status_code: u16,
    pub content_type: String,
    pub headers: BTreeMap<String, String>,
}

impl CacheEntry {
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(self).map_err(|e| CacheError::Codec(e.to_string()))
    }

    pub fn decode(raw: &[u8]) -> Result<Self, CacheError> {
        serde_json::from_slice(raw).map_err(|e| CacheError::Codec(e.to_string()))
    }
}

mod body_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
