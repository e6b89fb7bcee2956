//! Caller identity and the access gate for block updater routes.

use std::convert::Infallible;

use anyhow::{Context, Result};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Capability held by editors; required by every block updater route.
pub const EDIT_OTHERS_POSTS: &str = "edit_others_posts";

/// Identity of the current request, set by the caller middleware.
///
/// Requests without credentials are anonymous and hold no capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// Whether the request presented valid credentials.
    pub authenticated: bool,
    /// Capabilities granted to the caller.
    pub capabilities: Vec<String>,
}

impl Caller {
    /// Caller without credentials.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated caller holding the editor capability.
    pub fn editor() -> Self {
        Self {
            authenticated: true,
            capabilities: vec![EDIT_OTHERS_POSTS.to_string()],
        }
    }

    /// Check if the caller holds a capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Caller>().cloned().unwrap_or_default())
    }
}

/// Authorization predicate applied to every block updater operation.
pub trait AccessGate: Send + Sync {
    /// Whether `caller` may use the block updater.
    fn permits(&self, caller: &Caller) -> bool;
}

/// Gate admitting callers that hold one capability.
#[derive(Debug, Clone)]
pub struct CapabilityGate {
    capability: String,
}

impl CapabilityGate {
    /// Gate on an arbitrary capability.
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
        }
    }

    /// Gate admitting editors only.
    pub fn editors() -> Self {
        Self::new(EDIT_OTHERS_POSTS)
    }
}

impl AccessGate for CapabilityGate {
    fn permits(&self, caller: &Caller) -> bool {
        caller.has_capability(&self.capability)
    }
}

/// Editor API tokens, held as SHA-256 digests (raw tokens are never stored).
#[derive(Debug, Clone, Default)]
pub struct EditorTokens {
    digests: Vec<[u8; 32]>,
}

impl EditorTokens {
    /// Build from hex-encoded SHA-256 digests.
    pub fn from_hex_digests<S: AsRef<str>>(hashes: &[S]) -> Result<Self> {
        let digests = hashes
            .iter()
            .map(|h| {
                let bytes = hex::decode(h.as_ref()).context("editor token hash is not hex")?;
                <[u8; 32]>::try_from(bytes.as_slice())
                    .context("editor token hash is not a SHA-256 digest")
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { digests })
    }

    /// Build from raw tokens.
    pub fn from_raw_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        Self {
            digests: tokens.iter().map(|t| digest(t.as_ref())).collect(),
        }
    }

    /// Check a presented token in constant time per configured digest.
    pub fn verify(&self, raw_token: &str) -> bool {
        let presented = digest(raw_token);
        self.digests
            .iter()
            .fold(false, |found, d| found | bool::from(d.as_slice().ct_eq(presented.as_slice())))
    }

    /// Number of configured tokens.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Whether no tokens are configured.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

/// Hex SHA-256 of a raw token, the form stored in configuration.
pub fn hash_token(raw_token: &str) -> String {
    hex::encode(digest(raw_token))
}

fn digest(raw_token: &str) -> [u8; 32] {
    Sha256::digest(raw_token.as_bytes()).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn editor_gate_requires_capability() {
        let gate = CapabilityGate::editors();
        assert!(gate.permits(&Caller::editor()));
        assert!(!gate.permits(&Caller::anonymous()));

        let author = Caller {
            authenticated: true,
            capabilities: vec!["edit_posts".to_string()],
        };
        assert!(!gate.permits(&author));
    }

    #[test]
    fn tokens_verify_against_hashes() {
        let hash = hash_token("s3cret");
        assert_eq!(hash.len(), 64);

        let tokens = EditorTokens::from_hex_digests(&[hash]).unwrap();
        assert!(tokens.verify("s3cret"));
        assert!(!tokens.verify("s3cret "));
        assert!(!tokens.verify(""));
    }

    #[test]
    fn raw_and_hashed_construction_agree() {
        let raw = EditorTokens::from_raw_tokens(&["a", "b"]);
        let hashed = EditorTokens::from_hex_digests(&[hash_token("a"), hash_token("b")]).unwrap();
        assert_eq!(raw.digests, hashed.digests);
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn malformed_hashes_are_rejected() {
        assert!(EditorTokens::from_hex_digests(&["zz"]).is_err());
        assert!(EditorTokens::from_hex_digests(&["abcd"]).is_err());
    }

    #[test]
    fn empty_token_set_accepts_nothing() {
        let tokens = EditorTokens::default();
        assert!(tokens.is_empty());
        assert!(!tokens.verify("anything"));
    }
}
