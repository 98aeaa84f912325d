//! Parsing of HTTP Basic `Authorization` header values.
//!
//! Every failure collapses into [`Error::Unauthorized`] so callers cannot tell
//! a malformed header apart from any other rejection.

use std::fmt;

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::errors::{Error, Result};

const SCHEME: &str = "Basic";

/// Standard alphabet that accepts input with or without trailing padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Identity and plaintext secret presented by a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    identity: String,
    secret: String,
}

impl Credential {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Render `Basic <base64(identity:secret)>`.
    pub fn encode_basic(&self) -> String {
        let payload = format!("{}:{}", self.identity, self.secret);
        format!("{SCHEME} {}", STANDARD.encode(payload))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Decode a raw header value into a [`Credential`].
///
/// Accepts either a bare base64 token or `Basic <token>` (scheme matched
/// case-insensitively). The payload is split on the first colon and both
/// halves are percent-decoded.
pub fn decode(raw: &str) -> Result<Credential> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let encoded = match tokens.as_slice() {
        [token] => *token,
        [scheme, token] if scheme.eq_ignore_ascii_case(SCHEME) => *token,
        _ => return Err(Error::Unauthorized),
    };

    let bytes = LENIENT
        .decode(encoded.as_bytes())
        .map_err(|_| Error::Unauthorized)?;
    let payload = String::from_utf8(bytes).map_err(|_| Error::Unauthorized)?;
    let (identity, secret) = payload.split_once(':').ok_or(Error::Unauthorized)?;

    Ok(Credential {
        identity: unescape(identity)?,
        secret: unescape(secret)?,
    })
}

fn unescape(value: &str) -> Result<String> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::Unauthorized)
}
