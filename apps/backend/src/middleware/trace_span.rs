//! Per-request tracing span.
//!
//! Every event emitted while a request is in flight, including the stage and
//! cache logs, carries the `access` span: trace id, request line, which kind
//! of credential was presented, and (once the response is known) the cache
//! outcome. Reads the `TraceId` set by `RequestTrace`, which must wrap this.

use std::future::{ready, Ready};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderMap};
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{field, info_span, Instrument};

use crate::cache::response_cache::X_CACHE;
use crate::middleware::request_trace::TraceId;

/// Which credential the request carried, without looking at its value.
fn credential_kind(headers: &HeaderMap) -> &'static str {
    if headers.contains_key("x-api-key") {
        return "api_key";
    }
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value.starts_with("Bearer ") => "bearer",
        Some(_) => "other",
        None => "none",
    }
}

#[derive(Clone, Default)]
pub struct TraceSpan;

impl<S, B> Transform<S, ServiceRequest> for TraceSpan
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceSpanMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceSpanMiddleware { service }))
    }
}

pub struct TraceSpanMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceSpanMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = req
            .extensions()
            .get::<TraceId>()
            .map(|id| id.0.clone())
            .unwrap_or_else(|| "missing-trace-id".to_string());

        let span = info_span!(
            "access",
            trace_id = %trace_id,
            method = %req.method(),
            path = %req.path(),
            credential = credential_kind(req.headers()),
            cache = field::Empty,
        );

        let fut = self.service.call(req).instrument(span.clone());

        Box::pin(async move {
            let result = fut.await;
            if let Ok(res) = &result {
                if let Some(outcome) = res.headers().get(X_CACHE).and_then(|v| v.to_str().ok()) {
                    span.record("cache", outcome);
                }
            }
            result
        })
    }
}
