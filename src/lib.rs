//! api-faker
//!
//! A schema-driven mock HTTP responder. A JSON document describes routes as
//! a nested path tree, the JSON returned for each method, and per-route
//! rules; requests are answered with that JSON, randomized through
//! placeholder tokens.
//!
//! # Features
//!
//! - **Nested Routes**: path trees of any depth, flattened into regex patterns
//! - **Capture Arguments**: pattern groups feed `args:N` placeholders
//! - **Placeholders**: random strings, integers, doubles, GPS coordinates and
//!   sequential ids
//! - **Rules**: array responses, status codes, headers and delays, with
//!   global defaults
//!
//! # Example Schema
//!
//! ```json
//! {
//!   "routes": {
//!     "users": {
//!       "GET": { "id": "int:c", "name": "string:8" },
//!       "(\\d+)": { "GET": { "id": "args:1", "bio": "string:lorem" } }
//!     }
//!   },
//!   "rules": {
//!     "global": { "GET": { "headers": ["X-Powered-By: api-faker"] } },
//!     "users": { "GET": { "type": "array", "count": 3, "delay": 200 } }
//!   }
//! }
//! ```
//!
//! `GET /?q=/users` returns three users with ids `0`, `1`, `2` after 200 ms;
//! `GET /?q=/users/42` returns a single user with id `"42"`.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod rules;
pub mod schema;
pub mod server;
pub mod template;

pub use config::Settings;
pub use dispatcher::{FakeResponse, ResponseDispatcher};
pub use error::FakerError;
pub use schema::Schema;
