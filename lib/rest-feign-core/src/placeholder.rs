//! `${...}` placeholder resolution against layered property sources.
//!
//! Client URLs are usually written as `${inventory.url}` or `https://${host}:${port:8080}/api`
//! and resolved once, when a proxy is built.
//!
//! ```
//! use rest_feign_core::{Environment, Properties};
//!
//! let env = Environment::empty().with_source(Properties::from_pairs([
//!     ("host", "svc.internal"),
//!     ("port", "8080"),
//! ]));
//!
//! assert_eq!(
//!     env.resolve_placeholders("http://${host}:${port}/api"),
//!     "http://svc.internal:8080/api"
//! );
//! assert_eq!(env.resolve_placeholders("${missing}/x"), "${missing}/x");
//! assert_eq!(env.resolve_placeholders("${missing:fallback}"), "fallback");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

const PREFIX: &str = "${";
const SUFFIX: char = '}';
const DEFAULT_SEPARATOR: char = ':';

/// A source of configuration properties.
pub trait PropertySource: Send + Sync {
    /// Looks up a property value.
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory property source.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds properties from key/value pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Sets a property, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl PropertySource for Properties {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Process environment variables.
///
/// A key is looked up verbatim first, then in its relaxed form: `inventory.base-url` is also
/// found as `INVENTORY_BASE_URL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    fn relaxed(key: &str) -> String {
        key.chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect()
    }
}

impl PropertySource for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| std::env::var(Self::relaxed(key)).ok())
    }
}

/// Ordered list of property sources; the first source defining a key wins.
#[derive(Clone, Default)]
pub struct Environment {
    sources: Vec<Arc<dyn PropertySource>>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl Environment {
    /// Environment without any source. Every placeholder stays unresolved.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Environment backed by the process environment variables.
    #[must_use]
    pub fn system() -> Self {
        Self::empty().with_source(SystemEnvironment)
    }

    /// Appends a source with lower precedence than the existing ones.
    #[must_use]
    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Inserts a source with higher precedence than the existing ones.
    #[must_use]
    pub fn with_override(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.insert(0, Arc::new(source));
        self
    }

    /// Looks up a raw property, without placeholder resolution.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.get(key))
    }

    /// Replaces `${key}` and `${key:default}` tokens.
    ///
    /// Values are resolved recursively. Unknown keys without default and self-referencing
    /// values are left verbatim.
    #[must_use]
    pub fn resolve_placeholders(&self, text: &str) -> String {
        resolve(text, self, &mut Vec::new())
    }
}

impl PropertySource for Environment {
    fn get(&self, key: &str) -> Option<String> {
        self.property(key)
    }
}

/// Resolves placeholders in `text` against a single source.
#[must_use]
pub fn resolve_placeholders(text: &str, source: &dyn PropertySource) -> String {
    resolve(text, source, &mut Vec::new())
}

fn resolve(text: &str, source: &dyn PropertySource, visiting: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(PREFIX) {
        out.push_str(&rest[..start]);
        let after = &rest[start + PREFIX.len()..];
        let Some(end) = closing_brace(after) else {
            // unterminated, keep the tail as is
            out.push_str(&rest[start..]);
            return out;
        };
        let token = &rest[start..start + PREFIX.len() + end + 1];
        let inner = &after[..end];
        out.push_str(&substitute(token, inner, source, visiting));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn substitute(
    token: &str,
    inner: &str,
    source: &dyn PropertySource,
    visiting: &mut Vec<String>,
) -> String {
    let (raw_key, default) = split_default(inner);
    let key = resolve(raw_key, source, visiting);

    if visiting.contains(&key) {
        return token.to_string();
    }

    if let Some(value) = source.get(&key) {
        visiting.push(key);
        let resolved = resolve(&value, source, visiting);
        visiting.pop();
        return resolved;
    }

    match default {
        Some(default) => resolve(default, source, visiting),
        None => token.to_string(),
    }
}

/// Byte offset of the `}` closing a placeholder whose content starts at `text[0]`.
fn closing_brace(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut idx = 0;
    while idx < text.len() {
        if text[idx..].starts_with(PREFIX) {
            depth += 1;
            idx += PREFIX.len();
            continue;
        }
        let c = text[idx..].chars().next()?;
        if c == SUFFIX {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
        idx += c.len_utf8();
    }
    None
}

/// Splits `key:default` at the first separator outside nested placeholders.
fn split_default(inner: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    let mut idx = 0;
    while idx < inner.len() {
        if inner[idx..].starts_with(PREFIX) {
            depth += 1;
            idx += PREFIX.len();
            continue;
        }
        let Some(c) = inner[idx..].chars().next() else {
            break;
        };
        if c == SUFFIX {
            depth = depth.saturating_sub(1);
        } else if c == DEFAULT_SEPARATOR && depth == 0 {
            return (&inner[..idx], Some(&inner[idx + 1..]));
        }
        idx += c.len_utf8();
    }
    (inner, None)
}
