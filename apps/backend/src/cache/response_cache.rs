//! Response cache decorator for idempotent GET requests.
//!
//! Hits are replayed without invoking the inner service. Misses buffer the
//! inner response once, store it, and send the buffered copy on. Store
//! failures of any kind degrade to a miss or a skipped write.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use actix_web::body::{to_bytes, BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderName, HeaderValue};
use actix_web::http::{Method, StatusCode};
use actix_web::{Error, HttpMessage, HttpResponse};
use tokio::time::timeout;
use tracing::debug;

use crate::auth::api_key::ApplicationCaller;
use crate::cache::entry::CacheEntry;
use crate::cache::key::derive_key;
use crate::cache::policy::CachePolicy;
use crate::cache::store::{CacheError, CacheStore};
use crate::config::app_config::CacheSettings;
use crate::logging::security;
use crate::pipeline::context::CallerContext;

pub const X_CACHE: &str = "x-cache";

// Never stored, and never replayed from older entries.
const SKIPPED_HEADERS: &[&str] = &[
    "content-length",
    "content-type",
    "transfer-encoding",
    "connection",
    "set-cookie",
    "x-cache",
    "x-trace-id",
];

fn is_skipped(name: &str) -> bool {
    SKIPPED_HEADERS.iter().any(|s| name.eq_ignore_ascii_case(s))
}

pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    timeout: Duration,
    default_prefix: String,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, settings: &CacheSettings) -> Self {
        Self {
            store,
            timeout: settings.timeout,
            default_prefix: settings.key_prefix.clone(),
        }
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let raw = match timeout(self.timeout, self.store.get(key)).await {
            Ok(Ok(raw)) => raw?,
            Ok(Err(err)) => {
                security::cache_degraded("get", key, &err.to_string());
                return None;
            }
            Err(_) => {
                security::cache_degraded("get", key, &CacheError::Timeout.to_string());
                return None;
            }
        };

        match CacheEntry::decode(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                security::cache_degraded("decode", key, &err.to_string());
                None
            }
        }
    }

    async fn persist(&self, key: &str, entry: &CacheEntry, ttl: Duration) {
        let encoded = match entry.encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                security::cache_degraded("encode", key, &err.to_string());
                return;
            }
        };

        match timeout(self.timeout, self.store.set(key, encoded, ttl)).await {
            Ok(Ok(())) => debug!(cache_key = key, ttl_ms = ttl.as_millis() as u64, "response cached"),
            Ok(Err(err)) => security::cache_degraded("set", key, &err.to_string()),
            Err(_) => security::cache_degraded("set", key, &CacheError::Timeout.to_string()),
        }
    }

    /// Run `service` behind the cache according to `policy`.
    pub async fn handle<S, B>(
        &self,
        policy: &CachePolicy,
        req: ServiceRequest,
        service: &S,
    ) -> Result<ServiceResponse<BoxBody>, Error>
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
        B: MessageBody + 'static,
    {
        if req.method() != Method::GET || !policy.applies_to(req.request()) {
            return service.call(req).await.map(ServiceResponse::map_into_boxed_body);
        }

        let caller_key = caller_key(&req);
        let key = derive_key(&policy.key_parts(
            req.request(),
            &self.default_prefix,
            caller_key.as_deref(),
        ));

        if let Some(entry) = self.lookup(&key).await {
            if let Some(response) = replay(entry) {
                debug!(cache_key = %key, "cache hit");
                return Ok(req.into_response(response));
            }
            security::cache_degraded("replay", &key, "stored entry has an invalid status");
        }

        let res = service.call(req).await?;
        let (mut res, entry) = capture(res).await?;
        self.persist(&key, &entry, policy.ttl).await;

        res.headers_mut()
            .insert(HeaderName::from_static(X_CACHE), HeaderValue::from_static("MISS"));
        Ok(res)
    }
}

fn caller_key(req: &ServiceRequest) -> Option<String> {
    let extensions = req.extensions();
    if let Some(caller) = extensions.get::<CallerContext>() {
        return Some(caller.claims.subject.to_string());
    }
    extensions
        .get::<ApplicationCaller>()
        .map(|app| app.application_id.clone())
}

/// Buffer the whole response body and snapshot it as a cache entry.
async fn capture<B>(res: ServiceResponse<B>) -> Result<(ServiceResponse<BoxBody>, CacheEntry), Error>
where
    B: MessageBody + 'static,
{
    let (req, res) = res.into_parts();
    let (head, body) = res.into_parts();

    let bytes = to_bytes(body).await.map_err(|err| {
        let err: Box<dyn StdError> = err.into();
        actix_web::error::ErrorInternalServerError(err.to_string())
    })?;

    let content_type = head
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut headers = BTreeMap::new();
    for (name, value) in head.headers().iter() {
        if is_skipped(name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            headers
                .entry(name.as_str().to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    let entry = CacheEntry {
        body: bytes.to_vec(),
        status_code: head.status().as_u16(),
        content_type,
        headers,
    };

    let res = head.set_body(bytes).map_into_boxed_body();
    Ok((ServiceResponse::new(req, res), entry))
}

/// Rebuild a response from a stored entry. `None` if the entry is unusable.
fn replay(entry: CacheEntry) -> Option<HttpResponse> {
    let status = StatusCode::from_u16(entry.status_code).ok()?;
    let mut builder = HttpResponse::build(status);

    for (name, value) in &entry.headers {
        if is_skipped(name) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            builder.append_header((name, value));
        }
    }
    if !entry.content_type.is_empty() {
        builder.insert_header((header::CONTENT_TYPE, entry.content_type));
    }
    builder.insert_header((X_CACHE, "HIT"));

    Some(builder.body(entry.body))
}

/// Exact-key cache invalidation for the business layer.
#[derive(Clone)]
pub struct CacheInvalidator {
    store: Arc<dyn CacheStore>,
    timeout: Duration,
}

impl CacheInvalidator {
    pub fn new(store: Arc<dyn CacheStore>, settings: &CacheSettings) -> Self {
        Self {
            store,
            timeout: settings.timeout,
        }
    }

    /// Delete `key`. Returns whether an entry was removed; failures are
    /// logged and reported as `false`.
    pub async fn invalidate(&self, key: &str) -> bool {
        match timeout(self.timeout, self.store.delete(key)).await {
            Ok(Ok(removed)) => removed,
            Ok(Err(err)) => {
                security::cache_degraded("delete", key, &err.to_string());
                false
            }
            Err(_) => {
                security::cache_degraded("delete", key, &CacheError::Timeout.to_string());
                false
            }
        }
    }
}
