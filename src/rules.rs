//! Rule resolution.
//!
//! Merges the global rule record and the route rule record for one method
//! into a fully defaulted [`EffectiveRuleConfig`].

use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default number of copies for `array` responses.
pub const DEFAULT_COUNT: usize = 5;

/// Largest accepted `count`. Larger values are malformed.
pub const MAX_COUNT: usize = 10_000;

/// Default response status.
pub const DEFAULT_CODE: u16 = 200;

/// Shape of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// The template, substituted once
    #[default]
    Unit,
    /// `count` independently substituted copies of the template
    Array,
}

impl ResponseKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "unit" => Some(Self::Unit),
            "array" => Some(Self::Array),
            _ => None,
        }
    }
}

/// Effective configuration for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveRuleConfig {
    pub kind: ResponseKind,
    pub count: usize,
    /// Artificial delay in milliseconds; `None` when disabled
    pub delay_ms: Option<u64>,
    pub code: u16,
    /// Raw `"Name: value"` lines, global ones first
    pub headers: Vec<String>,
}

impl Default for EffectiveRuleConfig {
    fn default() -> Self {
        Self {
            kind: ResponseKind::Unit,
            count: DEFAULT_COUNT,
            delay_ms: None,
            code: DEFAULT_CODE,
            headers: Vec::new(),
        }
    }
}

impl EffectiveRuleConfig {
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }
}

/// A single rule layer with every field validated.
///
/// Fields that are missing or malformed in the source record are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleRecord {
    pub kind: Option<ResponseKind>,
    pub count: Option<usize>,
    pub delay_ms: Option<u64>,
    pub code: Option<u16>,
    pub headers: Vec<String>,
}

impl RuleRecord {
    /// Parse a rule record. Never fails: anything unusable is dropped.
    pub fn parse(value: &Value) -> Self {
        let Value::Object(record) = value else {
            debug!(value = %value, "Ignoring rule record that is not an object");
            return Self::default();
        };

        let kind = record.get("type").and_then(|v| {
            let kind = v.as_str().and_then(ResponseKind::parse);
            if kind.is_none() {
                ignored("type", v);
            }
            kind
        });

        let count = record.get("count").and_then(|v| {
            let count = parse_unsigned(v)
                .and_then(|n| usize::try_from(n).ok())
                .filter(|n| (1..=MAX_COUNT).contains(n));
            if count.is_none() {
                ignored("count", v);
            }
            count
        });

        let delay_ms = record.get("delay").and_then(|v| {
            let delay = parse_unsigned(v);
            if delay.is_none() {
                ignored("delay", v);
            }
            delay
        });

        let code = record.get("code").and_then(|v| {
            let code = parse_unsigned(v)
                .filter(|n| (100..=999).contains(n))
                .map(|n| n as u16);
            if code.is_none() {
                ignored("code", v);
            }
            code
        });

        let headers = match record.get("headers") {
            Some(Value::Array(lines)) => lines
                .iter()
                .filter_map(|line| match line {
                    Value::String(line) => Some(line.clone()),
                    other => {
                        ignored("headers", other);
                        None
                    }
                })
                .collect(),
            Some(other) => {
                ignored("headers", other);
                Vec::new()
            }
            None => Vec::new(),
        };

        Self {
            kind,
            count,
            delay_ms,
            code,
            headers,
        }
    }
}

fn ignored(field: &str, value: &Value) {
    debug!(field, value = %value, "Ignoring malformed rule value");
}

/// Parse a non-negative integer given either as a JSON integer or as a
/// string of ASCII digits.
pub fn parse_unsigned(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }
}

/// Merge the global and route rule records for one method.
///
/// `type`, `delay` and `code` are last-wins over the defaults, then the
/// global layer, then the route layer. `count` only comes from the route.
/// Headers accumulate, global first.
pub fn resolve(global: Option<&Value>, route: Option<&Value>) -> EffectiveRuleConfig {
    let global = global.map(RuleRecord::parse).unwrap_or_default();
    let route = route.map(RuleRecord::parse).unwrap_or_default();

    let mut config = EffectiveRuleConfig::default();

    for layer in [&global, &route] {
        if let Some(kind) = layer.kind {
            config.kind = kind;
        }
        if let Some(delay) = layer.delay_ms {
            config.delay_ms = Some(delay);
        }
        if let Some(code) = layer.code {
            config.code = code;
        }
        config.headers.extend(layer.headers.iter().cloned());
    }

    if let Some(count) = route.count {
        config.count = count;
    }

    config
}
