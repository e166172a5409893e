// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Schleuse app-handoff bridge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SchleuseError};

/// Request and response parameters as they travel over the URL wire.
///
/// Keys and values are plain strings; percent-encoding is applied at the
/// protocol layer, never stored here. A `BTreeMap` keeps outbound URLs
/// deterministic, which makes them diffable in logs and tests.
pub type Parameters = BTreeMap<String, String>;

/// Opaque unique token that correlates a return URL with the request that
/// produced it.
///
/// Generated once at request construction and never reused. The external
/// surface must round-trip it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationToken(pub Uuid);

impl CorrelationToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token from its wire form. Returns `None` for anything that is
    /// not a UUID (foreign callbacks carry arbitrary strings).
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mechanism used to leave the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    /// App-switch to a native peer application via its custom URL scheme.
    NativeApp,
    /// In-app browser surface presented over the host's view hierarchy.
    BrowserSurface,
}

/// The caller's transport wish.
///
/// `NativeApp` is a preference, not a guarantee: when the opener's
/// feasibility check says the peer is unreachable, the bridge downgrades to
/// the browser surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportPreference {
    NativeApp,
    BrowserSurface,
}

/// Why a bridge request failed.
///
/// Cancellation is deliberately *not* represented here; it is a distinct,
/// non-error outcome (`BridgeResponse::Cancelled`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The native peer or browser surface could not be opened at all.
    Unreachable,
    /// A new request preempted this one before it resolved.
    Superseded,
    /// The return URL was present but undecodable, or its token did not
    /// match after the controller's own filtering.
    Malformed,
    /// The external side reported an explicit error.
    Remote { code: String },
}

/// Terminal outcome of a bridge request. Produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeResponse {
    /// The external surface completed the flow and returned a payload.
    Success { parameters: Parameters },
    /// The user backed out without completing the flow.
    Cancelled,
    /// The flow failed; see [`FailureKind`].
    Failed { kind: FailureKind, message: String },
}

impl BridgeResponse {
    /// Convenience constructor for failures.
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }
}

/// Immutable description of an outbound bridge request.
///
/// Fields are private: every reachable `BridgeRequest` has a non-empty
/// action and a generated correlation token, so downstream code never
/// re-validates.
#[derive(Debug, Clone)]
pub struct BridgeRequest {
    action: String,
    parameters: Parameters,
    token: CorrelationToken,
    method_version: Option<String>,
}

impl BridgeRequest {
    /// Create a request for `action` carrying `parameters`.
    ///
    /// Generates a fresh correlation token. The action name becomes the host
    /// component of the outbound URL, so it must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`SchleuseError::InvalidRequest`] when `action` is empty or
    /// whitespace-only.
    pub fn new(action: impl Into<String>, parameters: Parameters) -> Result<Self> {
        let action = action.into();
        if action.trim().is_empty() {
            return Err(SchleuseError::InvalidRequest(
                "action name must not be empty".into(),
            ));
        }
        Ok(Self {
            action,
            parameters,
            token: CorrelationToken::new(),
            method_version: None,
        })
    }

    /// Tag the request with an explicit protocol method version.
    pub fn with_method_version(mut self, version: impl Into<String>) -> Self {
        self.method_version = Some(version.into());
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    pub fn method_version(&self) -> Option<&str> {
        self.method_version.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_generates_unique_tokens() {
        let a = BridgeRequest::new("share", Parameters::new()).expect("request");
        let b = BridgeRequest::new("share", Parameters::new()).expect("request");
        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn empty_action_is_rejected() {
        let err = BridgeRequest::new("", Parameters::new());
        assert!(matches!(err, Err(SchleuseError::InvalidRequest(_))));

        let err = BridgeRequest::new("   ", Parameters::new());
        assert!(matches!(err, Err(SchleuseError::InvalidRequest(_))));
    }

    #[test]
    fn token_round_trips_through_wire_form() {
        let token = CorrelationToken::new();
        let parsed = CorrelationToken::parse(&token.to_string()).expect("parse");
        assert_eq!(parsed, token);
    }

    #[test]
    fn foreign_token_strings_do_not_parse() {
        assert!(CorrelationToken::parse("not-a-token").is_none());
        assert!(CorrelationToken::parse("").is_none());
    }

    #[test]
    fn method_version_is_optional() {
        let req = BridgeRequest::new("login", Parameters::new()).expect("request");
        assert!(req.method_version().is_none());

        let req = req.with_method_version("2");
        assert_eq!(req.method_version(), Some("2"));
    }
}
