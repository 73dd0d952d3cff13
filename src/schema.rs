//! Schema flattening.
//!
//! A schema document carries two nested path trees, `routes` and `rules`.
//! Each tree is flattened into an ordered table keyed by the full,
//! slash-joined path of every node. Declaration order is preserved because
//! it decides match priority.
//!
//! ```json
//! {
//!   "routes": {
//!     "users": {
//!       "GET": ["string"],
//!       "(\\d+)": { "GET": { "id": "args:1" } }
//!     }
//!   },
//!   "rules": {
//!     "global": { "GET": { "headers": ["X-Faker: 1"] } },
//!     "users": { "GET": { "type": "array", "count": 3 } }
//!   }
//! }
//! ```
//!
//! flattens the routes to `/users` and `/users/(\d+)`.

use crate::error::FakerError;
use crate::matcher::{MatchResult, RouteMatcher};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Keys that hold a node's per-method record instead of a path segment.
pub const METHOD_KEYS: [&str; 2] = ["GET", "POST"];

/// Reserved top-level key of the `rules` tree holding default rules.
pub const GLOBAL_RULES: &str = "global";

/// Per-method record of a terminal node (method -> template or rule).
pub type MethodRecord = Map<String, Value>;

/// Whether `key` is one of the reserved method keys.
pub fn is_method_key(key: &str) -> bool {
    METHOD_KEYS.contains(&key)
}

/// Ordered table from flattened path to the record found at that path.
#[derive(Debug, Clone, Default)]
pub struct FlatTree {
    entries: Vec<(String, MethodRecord)>,
    index: HashMap<String, usize>,
}

impl FlatTree {
    /// Install `record` at `path`. A path that is already present keeps its
    /// position and takes the new record.
    pub fn insert(&mut self, path: String, record: MethodRecord) {
        match self.index.get(&path) {
            Some(&i) => self.entries[i].1 = record,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, record));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&MethodRecord> {
        self.index.get(path).map(|&i| &self.entries[i].1)
    }

    /// Entries in flattening order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MethodRecord)> {
        self.entries.iter().map(|(path, record)| (path.as_str(), record))
    }

    /// Flattened paths in flattening order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flatten a nested path tree rooted at `base`.
///
/// The root's own method keys land at `base`; every other key is a path
/// segment, walked depth-first. The input is only read, the output is
/// accumulated into a fresh table.
pub fn flatten(tree: &Map<String, Value>, base: &str) -> FlatTree {
    let mut flat = FlatTree::default();
    let root = terminal_record(tree);
    if !root.is_empty() {
        flat.insert(base.to_string(), root);
    }
    flatten_into(tree, base, &mut flat);
    flat
}

fn flatten_into(node: &Map<String, Value>, base: &str, flat: &mut FlatTree) {
    for (segment, child) in node.iter().filter(|(key, _)| !is_method_key(key)) {
        let path = join_path(base, segment);
        match child {
            Value::Object(children) => {
                flat.insert(path.clone(), terminal_record(children));
                flatten_into(children, &path, flat);
            }
            // Still addressable, just with nothing to serve.
            _ => flat.insert(path, MethodRecord::new()),
        }
    }
}

fn terminal_record(node: &Map<String, Value>) -> MethodRecord {
    node.iter()
        .filter(|(key, _)| is_method_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Append `segment` to `base`. The root `/` contributes no prefix and a
/// segment that already starts with `/` gets no extra separator.
pub fn join_path(base: &str, segment: &str) -> String {
    let prefix = if base == "/" { "" } else { base };
    if segment.starts_with('/') {
        format!("{}{}", prefix, segment)
    } else {
        format!("{}/{}", prefix, segment)
    }
}

/// A schema document flattened and ready to resolve requests.
#[derive(Debug, Clone)]
pub struct Schema {
    routes: FlatTree,
    rules: FlatTree,
    global: MethodRecord,
    matcher: RouteMatcher,
}

impl Schema {
    /// Flatten both trees of a decoded schema document and compile the
    /// route patterns.
    pub fn from_document(document: &Value) -> Result<Self, FakerError> {
        let routes = match document.get("routes") {
            Some(Value::Object(tree)) if !tree.is_empty() => flatten(tree, "/"),
            _ => return Err(FakerError::SchemaMissingRoutes),
        };

        let (rules, global) = match document.get("rules") {
            Some(Value::Object(tree)) => {
                let global = match tree.get(GLOBAL_RULES) {
                    Some(Value::Object(record)) => terminal_record(record),
                    _ => MethodRecord::new(),
                };
                let scoped: Map<String, Value> = tree
                    .iter()
                    .filter(|(key, _)| key.as_str() != GLOBAL_RULES)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                (flatten(&scoped, "/"), global)
            }
            _ => (FlatTree::default(), MethodRecord::new()),
        };

        let matcher = RouteMatcher::new(routes.paths());

        debug!(
            routes = routes.len(),
            rules = rules.len(),
            global_methods = global.len(),
            "Schema flattened"
        );

        Ok(Self {
            routes,
            rules,
            global,
            matcher,
        })
    }

    pub fn routes(&self) -> &FlatTree {
        &self.routes
    }

    pub fn rules(&self) -> &FlatTree {
        &self.rules
    }

    /// Resolve a request path to the first matching route pattern.
    pub fn find_route(&self, path: &str) -> Result<MatchResult, FakerError> {
        self.matcher.find_match(path)
    }

    /// Response template for `method` at a flattened route.
    pub fn template(&self, route: &str, method: &str) -> Option<&Value> {
        self.routes.get(route).and_then(|record| record.get(method))
    }

    /// Rule record for `method` at a flattened route.
    pub fn route_rule(&self, route: &str, method: &str) -> Option<&Value> {
        self.rules.get(route).and_then(|record| record.get(method))
    }

    /// Global rule record for `method`.
    pub fn global_rule(&self, method: &str) -> Option<&Value> {
        self.global.get(method)
    }

    /// Route patterns that failed to compile.
    pub fn invalid_patterns(&self) -> Vec<(&str, &regex::Error)> {
        self.matcher.invalid_patterns().collect()
    }
}
