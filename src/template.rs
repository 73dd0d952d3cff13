//! Placeholder engine for dynamic responses.
//!
//! Walks a JSON response template and replaces string leaves written as
//! `type[:param]` tokens with generated values:
//!
//! | token          | value                                                 |
//! |----------------|-------------------------------------------------------|
//! | `string`       | 11 random letters                                     |
//! | `string:N`     | N+1 random letters                                    |
//! | `string:lorem` | a fixed lorem ipsum sentence                          |
//! | `int:N`        | random integer with exactly N digits                  |
//! | `int:c`        | counter, 0, 1, 2, ... across one response             |
//! | `double`       | random float in [10, 100) with six decimals           |
//! | `args[:k]`     | k-th capture of the route pattern (default: second)   |
//! | `gps:lat`      | latitude in [-90, 90]                                 |
//! | `gps:lon`      | longitude in [-180, 180]                              |
//!
//! Any other string, and every non-string value, is kept as is.

use rand::rngs::ThreadRng;
use rand::Rng;
use serde_json::Value;

/// Replacement for `string:lorem`.
pub const LOREM: &str = "Lorem ipsum commodi autem hic eum est blanditiis dolor it.";

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const DEFAULT_STRING_LENGTH: usize = 10;

/// Upper bound on `string:N` so a typo cannot exhaust memory.
const MAX_STRING_LENGTH: usize = 1 << 20;

/// A recognized placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Lorem,
    /// Random letters. The generator is inclusive of `length`, so
    /// `length + 1` letters come out.
    Letters { length: usize },
    Int { digits: u32 },
    Counter,
    Double,
    /// 0-based index into the capture arguments
    Arg { index: usize },
    Latitude,
    Longitude,
}

impl Token {
    /// Parse a string leaf. `None` means the string is a literal.
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, param) = match s.split_once(':') {
            Some((kind, param)) => (kind, Some(param)),
            None => (s, None),
        };

        match kind {
            "string" => Some(match param {
                Some("lorem") => Token::Lorem,
                Some(p) if is_digits(p) => Token::Letters {
                    length: parse_digits(p).min(MAX_STRING_LENGTH as u64) as usize,
                },
                _ => Token::Letters {
                    length: DEFAULT_STRING_LENGTH,
                },
            }),
            "int" => match param {
                Some("c") => Some(Token::Counter),
                Some(p) if is_digits(p) => Some(Token::Int {
                    digits: u32::try_from(parse_digits(p)).unwrap_or(u32::MAX),
                }),
                _ => None,
            },
            "double" => Some(Token::Double),
            // Without an explicit position the index is 1 as is; explicit
            // positions are 1-based, with 0 also meaning the first.
            "args" => Some(Token::Arg {
                index: match param {
                    Some(p) if is_digits(p) => usize::try_from(parse_digits(p))
                        .unwrap_or(usize::MAX)
                        .saturating_sub(1),
                    _ => 1,
                },
            }),
            "gps" => match param {
                Some("lat") => Some(Token::Latitude),
                Some("lon") => Some(Token::Longitude),
                _ => None,
            },
            _ => None,
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a digit string, saturating instead of overflowing.
fn parse_digits(s: &str) -> u64 {
    s.parse().unwrap_or(u64::MAX)
}

/// Inclusive bounds of an integer with exactly `digits` decimal digits,
/// saturating at `i64::MAX`. Zero digits behaves like one.
pub fn int_bounds(digits: u32) -> (i64, i64) {
    let digits = digits.max(1);
    let lower = 10i64.checked_pow(digits - 1).unwrap_or(i64::MAX);
    let upper = 10i64
        .checked_pow(digits)
        .map(|n| n - 1)
        .unwrap_or(i64::MAX);
    (lower, upper)
}

/// Placeholder engine for rendering response templates.
pub struct PlaceholderEngine<R = ThreadRng> {
    rng: R,
}

impl PlaceholderEngine<ThreadRng> {
    /// Create an engine backed by the thread-local generator.
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for PlaceholderEngine<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PlaceholderEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Render a template with the route's capture arguments.
    ///
    /// The `int:c` counter starts at 0 for every call and runs across the
    /// whole document in depth-first order.
    pub fn render_json(&mut self, template: &Value, args: &[String]) -> Value {
        let mut counter = 0;
        self.render_json_value(template, args, &mut counter)
    }

    fn render_json_value(&mut self, value: &Value, args: &[String], counter: &mut u64) -> Value {
        match value {
            Value::String(s) => match Token::parse(s) {
                Some(token) => self.render_token(token, args, counter),
                None => value.clone(),
            },
            Value::Array(arr) => Value::Array(
                arr.iter()
                    .map(|v| self.render_json_value(v, args, counter))
                    .collect(),
            ),
            Value::Object(obj) => {
                let mut rendered = serde_json::Map::new();
                for (k, v) in obj {
                    rendered.insert(k.clone(), self.render_json_value(v, args, counter));
                }
                Value::Object(rendered)
            }
            _ => value.clone(),
        }
    }

    fn render_token(&mut self, token: Token, args: &[String], counter: &mut u64) -> Value {
        match token {
            Token::Lorem => Value::from(LOREM),
            Token::Letters { length } => {
                let letters: String = (0..=length)
                    .map(|_| LETTERS[self.rng.gen_range(0..LETTERS.len())] as char)
                    .collect();
                Value::String(letters)
            }
            Token::Int { digits } => {
                let (lower, upper) = int_bounds(digits);
                Value::from(self.rng.gen_range(lower..=upper))
            }
            Token::Counter => {
                let current = *counter;
                *counter += 1;
                Value::from(current)
            }
            Token::Double => Value::from(self.micro_units(10_000_000, 99_999_999)),
            Token::Arg { index } => match args.get(index) {
                Some(arg) => Value::String(arg.clone()),
                None => Value::String(format!(
                    "Undefined argument {}",
                    index.saturating_add(1)
                )),
            },
            Token::Latitude => Value::from(self.micro_units(-90_000_000, 90_000_000)),
            Token::Longitude => Value::from(self.micro_units(-180_000_000, 180_000_000)),
        }
    }

    /// Uniform integer in `[low, high]` scaled down by one million, giving
    /// six-decimal precision.
    fn micro_units(&mut self, low: i64, high: i64) -> f64 {
        self.rng.gen_range(low..=high) as f64 / 1_000_000.0
    }
}
