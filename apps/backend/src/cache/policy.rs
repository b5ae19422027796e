//! Per-route cache configuration and its named presets.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpRequest;

use crate::cache::key::KeyParts;

pub type CacheCondition = Arc<dyn Fn(&HttpRequest) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct CachePolicy {
    pub ttl: Duration,
    /// Falls back to the configured default prefix when unset.
    pub prefix: Option<String>,
    pub vary_by_user: bool,
    pub vary_by_query: bool,
    pub vary_by_headers: Vec<String>,
    pub condition: Option<CacheCondition>,
}

impl CachePolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            prefix: None,
            vary_by_user: false,
            vary_by_query: false,
            vary_by_headers: Vec::new(),
            condition: None,
        }
    }

    /// 5 minutes.
    pub fn short() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }

    /// 15 minutes.
    pub fn medium() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }

    /// 1 hour.
    pub fn long() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }

    pub fn user_specific(ttl: Duration) -> Self {
        Self::new(ttl).vary_by_user()
    }

    pub fn with_query(ttl: Duration) -> Self {
        Self::new(ttl).vary_by_query()
    }

    pub fn conditional<F>(ttl: Duration, condition: F) -> Self
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        Self::new(ttl).when(condition)
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn vary_by_user(mut self) -> Self {
        self.vary_by_user = true;
        self
    }

    pub fn vary_by_query(mut self) -> Self {
        self.vary_by_query = true;
        self
    }

    pub fn vary_by_header(mut self, name: impl Into<String>) -> Self {
        self.vary_by_headers.push(name.into());
        self
    }

    /// Only cache requests for which `condition` returns true.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn applies_to(&self, req: &HttpRequest) -> bool {
        self.condition.as_ref().map_or(true, |condition| condition(req))
    }

    /// Collect the dimensions this policy varies on from `req`.
    pub fn key_parts(&self, req: &HttpRequest, default_prefix: &str, user_id: Option<&str>) -> KeyParts {
        let prefix = self
            .prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(default_prefix);

        let headers = self
            .vary_by_headers
            .iter()
            .filter_map(|name| {
                let value = req.headers().get(name.as_str())?.to_str().ok()?;
                Some((name.clone(), value.to_string()))
            })
            .collect();

        KeyParts {
            prefix: prefix.to_string(),
            path: req.path().to_string(),
            user_id: if self.vary_by_user { user_id.map(str::to_string) } else { None },
            query: if self.vary_by_query { Some(req.query_string().to_string()) } else { None },
            headers,
        }
    }
}

impl fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePolicy")
            .field("ttl", &self.ttl)
            .field("prefix", &self.prefix)
            .field("vary_by_user", &self.vary_by_user)
            .field("vary_by_query", &self.vary_by_query)
            .field("vary_by_headers", &self.vary_by_headers)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}
