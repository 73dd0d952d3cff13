//! Route matching logic.
//!
//! Matches a request path against the flattened route patterns. Every
//! pattern is a regular expression anchored to the whole path; the first
//! pattern in declaration order that matches wins.

use crate::error::FakerError;
use regex::Regex;

/// Outcome of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The flattened route pattern that matched
    pub pattern: String,
    /// Capture groups, left to right
    pub args: Vec<String>,
}

/// Route matcher engine.
#[derive(Debug, Clone, Default)]
pub struct RouteMatcher {
    routes: Vec<CompiledRoute>,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    pattern: String,
    regex: Result<Regex, regex::Error>,
}

impl RouteMatcher {
    /// Compile route patterns, keeping their order. Patterns that fail to
    /// compile are kept so they can be reported where they sit.
    pub fn new<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Self {
        let routes = patterns
            .into_iter()
            .map(|pattern| CompiledRoute {
                pattern: pattern.to_string(),
                regex: Regex::new(&format!("^(?:{})$", pattern)),
            })
            .collect();

        Self { routes }
    }

    /// Find the first route whose pattern matches the whole `path`.
    ///
    /// Reaching a pattern that does not compile before any match is an
    /// error of its own, not a miss.
    pub fn find_match(&self, path: &str) -> Result<MatchResult, FakerError> {
        for route in &self.routes {
            let regex = match &route.regex {
                Ok(regex) => regex,
                Err(source) => {
                    return Err(FakerError::InvalidPattern {
                        pattern: route.pattern.clone(),
                        source: source.clone(),
                    })
                }
            };

            if let Some(captures) = regex.captures(path) {
                let args = captures
                    .iter()
                    .skip(1)
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                return Ok(MatchResult {
                    pattern: route.pattern.clone(),
                    args,
                });
            }
        }

        Err(FakerError::NoRouteMatch {
            path: path.to_string(),
        })
    }

    /// Patterns that failed to compile, with the compiler's error.
    pub fn invalid_patterns(&self) -> impl Iterator<Item = (&str, &regex::Error)> {
        self.routes.iter().filter_map(|route| match &route.regex {
            Ok(_) => None,
            Err(err) => Some((route.pattern.as_str(), err)),
        })
    }
}
