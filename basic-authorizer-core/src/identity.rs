//! Mapping between caller identities and secret store keys.
//!
//! Store key names may not contain `@`, so identities are escaped with
//! `_` → `__` and `@` → `_AT_`. Doubling the underscore keeps the mapping
//! injective: `a_AT_b` and `a@b` never share a key.

pub const DEFAULT_KEY_PREFIX: &str = "/basic-authorizer/credentials/";

const ESCAPE: char = '_';
const AT_TOKEN: &str = "_AT_";

/// Escape an identity into the store key alphabet.
pub fn escape(identity: &str) -> String {
    let mut out = String::with_capacity(identity.len() + 8);
    for c in identity.chars() {
        match c {
            '@' => out.push_str(AT_TOKEN),
            ESCAPE => out.push_str("__"),
            other => out.push(other),
        }
    }
    out
}

/// Invert [`escape`]. Returns `None` for sequences `escape` never produces.
fn unescape(escaped: &str) -> Option<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(idx) = rest.find(ESCAPE) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        if let Some(after) = tail.strip_prefix("__") {
            out.push(ESCAPE);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(AT_TOKEN) {
            out.push('@');
            rest = after;
        } else {
            return None;
        }
    }
    out.push_str(rest);
    Some(out)
}

/// Builds store keys from identities under a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    prefix: String,
}

impl KeyScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store_key(&self, identity: &str) -> String {
        format!("{}{}", self.prefix, escape(identity))
    }

    /// Recover the identity from a key produced by [`KeyScheme::store_key`].
    pub fn identity(&self, key: &str) -> Option<String> {
        key.strip_prefix(&self.prefix).and_then(unescape)
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}
