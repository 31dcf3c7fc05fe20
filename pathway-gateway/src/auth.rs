//! Bearer credential gate for /api/* routes
//!
//! Tokens are opaque; issuance and rotation happen elsewhere. The gate only
//! checks that a presented token is in the configured set.

use hyper::header::{HeaderMap, AUTHORIZATION};
use std::collections::HashSet;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization: Bearer` header
    Missing,
    /// Token not in the configured set
    Rejected,
}

impl AuthFailure {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Missing => "Missing bearer token",
            Self::Rejected => "Invalid bearer token",
        }
    }
}

/// Accepts requests carrying one of a fixed set of bearer tokens.
#[derive(Debug, Clone)]
pub struct BearerGate {
    tokens: HashSet<String>,
    disabled: bool,
}

impl BearerGate {
    pub fn new(tokens: HashSet<String>) -> Self {
        Self {
            tokens,
            disabled: false,
        }
    }

    /// Gate that admits everything (dev mode).
    pub fn disabled() -> Self {
        Self {
            tokens: HashSet::new(),
            disabled: true,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Check the `Authorization` header.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), AuthFailure> {
        if self.disabled {
            return Ok(());
        }

        let token = bearer_token(headers).ok_or(AuthFailure::Missing)?;
        if self.tokens.contains(token) {
            Ok(())
        } else {
            Err(AuthFailure::Rejected)
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
