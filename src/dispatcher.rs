//! Response dispatcher.
//!
//! Runs the whole pipeline for one request: route matching, rule
//! resolution, template replication and placeholder substitution, then the
//! artificial delay.

use crate::error::FakerError;
use crate::rules::{self, EffectiveRuleConfig, ResponseKind};
use crate::schema::Schema;
use crate::template::PlaceholderEngine;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Content type of every response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A fully built response, ready to be written.
#[derive(Debug, Clone)]
pub struct FakeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    /// Wait applied before the response is written
    pub delay: Option<Duration>,
}

impl FakeResponse {
    /// The `{"message": ...}` answer for a request that could not be served.
    /// Status stays 200.
    pub fn from_error(err: &FakerError) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Self {
            status: StatusCode::OK,
            headers,
            body: json!({ "message": err.to_string() }),
            delay: None,
        }
    }
}

impl IntoResponse for FakeResponse {
    fn into_response(self) -> Response {
        match serde_json::to_string_pretty(&self.body) {
            Ok(body) => (self.status, self.headers, body).into_response(),
            Err(e) => {
                warn!(error = %e, "Failed to serialize response body");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Orchestrates the resolution pipeline.
#[derive(Debug, Clone, Default)]
pub struct ResponseDispatcher {
    /// Report missing rule records at `warn` instead of `debug`
    pub show_warnings: bool,
}

impl ResponseDispatcher {
    pub fn new(show_warnings: bool) -> Self {
        Self { show_warnings }
    }

    /// Build the response for `method` on `path` and wait out its delay.
    pub async fn respond(&self, schema: &Schema, method: &str, path: &str) -> FakeResponse {
        let response = self.build(schema, method, path, &mut PlaceholderEngine::new());

        if let Some(delay) = response.delay {
            debug!(delay_ms = delay.as_millis() as u64, "Applying delay");
            tokio::time::sleep(delay).await;
        }

        response
    }

    /// Build the response for `method` on `path` without waiting.
    pub fn build<R: Rng>(
        &self,
        schema: &Schema,
        method: &str,
        path: &str,
        engine: &mut PlaceholderEngine<R>,
    ) -> FakeResponse {
        match self.try_build(schema, method, path, engine) {
            Ok(response) => response,
            Err(err) => {
                warn!(method = %method, path = %path, reason = %err, "No response for request");
                FakeResponse::from_error(&err)
            }
        }
    }

    fn try_build<R: Rng>(
        &self,
        schema: &Schema,
        method: &str,
        path: &str,
        engine: &mut PlaceholderEngine<R>,
    ) -> Result<FakeResponse, FakerError> {
        let matched = schema.find_route(path)?;

        let template = schema.template(&matched.pattern, method).ok_or_else(|| {
            FakerError::MethodNotSupported {
                method: method.to_string(),
                route: matched.pattern.clone(),
            }
        })?;

        if schema.route_rule(&matched.pattern, method).is_none() {
            if self.show_warnings {
                warn!(route = %matched.pattern, method = %method, "No rules for route");
            } else {
                debug!(route = %matched.pattern, method = %method, "No rules for route");
            }
        }

        let config = rules::resolve(
            schema.global_rule(method),
            schema.route_rule(&matched.pattern, method),
        );

        info!(
            route = %matched.pattern,
            method = %method,
            path = %path,
            code = config.code,
            kind = ?config.kind,
            "Request matched route"
        );

        let body = match config.kind {
            ResponseKind::Array => {
                let copies = Value::Array(vec![template.clone(); config.count]);
                engine.render_json(&copies, &matched.args)
            }
            ResponseKind::Unit => engine.render_json(template, &matched.args),
        };

        Ok(FakeResponse {
            status: StatusCode::from_u16(config.code).unwrap_or(StatusCode::OK),
            headers: build_headers(&config),
            body,
            delay: config.delay(),
        })
    }
}

/// Apply the rule headers in order, then the JSON content type. A later
/// header replaces an earlier one with the same name.
fn build_headers(config: &EffectiveRuleConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for line in &config.headers {
        match parse_header_line(line) {
            Some((name, value)) => {
                headers.insert(name, value);
            }
            None => warn!(header = %line, "Ignoring malformed header"),
        }
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers
}

/// Split a raw `"Name: value"` line.
pub fn parse_header_line(line: &str) -> Option<(HeaderName, HeaderValue)> {
    let (name, value) = line.split_once(':')?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).ok()?;
    let value = HeaderValue::from_str(value.trim()).ok()?;
    Some((name, value))
}
