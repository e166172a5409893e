// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchleuseError};

/// Settings for the app-handoff bridge.
///
/// One scheme serves both directions: outbound URLs are built as
/// `scheme://action?...` and return URLs must arrive under the same scheme
/// to be considered at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Custom URL scheme registered for this application.
    pub scheme: String,
    /// Method version stamped on outbound requests that do not carry their
    /// own (see `BridgeRequest::with_method_version`).
    pub default_method_version: Option<String>,
    /// Suggested watchdog timeout in seconds for hosts that arm one.
    /// `None` means no timeout; the bridge itself never expires a request.
    pub resume_watchdog_secs: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scheme: "schleuse".into(),
            default_method_version: None,
            resume_watchdog_secs: None,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration for the given callback scheme.
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            ..Self::default()
        }
    }

    /// Check that the configured scheme can legally start a URL
    /// (RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )).
    ///
    /// # Errors
    ///
    /// Returns [`SchleuseError::InvalidConfig`] for an empty or malformed
    /// scheme.
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.scheme.chars();
        let valid = match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(SchleuseError::InvalidConfig(format!(
                "`{}` is not a valid URL scheme",
                self.scheme
            )))
        }
    }

    /// Deserialize a configuration from JSON (host apps typically embed the
    /// bridge settings in their own config file).
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
