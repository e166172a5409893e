// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for bridge outcomes.
//
// The bridge never surfaces anything to the user itself; the host UI decides
// how. This module gives hosts a ready-made mapping from technical outcomes
// to plain English with a severity that drives presentation.

use crate::error::SchleuseError;
use crate::types::{BridgeResponse, FailureKind};

/// Severity of an outcome from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth retrying as-is; the external surface may just have been busy.
    Transient,
    /// The user must do something before retrying (install the peer app,
    /// finish the flow instead of dismissing it).
    ActionRequired,
    /// Retrying the same request will not help.
    Permanent,
}

/// A human-readable outcome with plain English message and suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the host should offer a retry.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Map a terminal [`BridgeResponse`] to a `HumanError`.
///
/// Returns `None` for `Success`, which needs no explaining.
pub fn humanize_response(response: &BridgeResponse) -> Option<HumanError> {
    match response {
        BridgeResponse::Success { .. } => None,

        BridgeResponse::Cancelled => Some(HumanError {
            message: "The request was cancelled.".into(),
            suggestion: "You can start again whenever you like.".into(),
            retriable: true,
            severity: Severity::Transient,
        }),

        BridgeResponse::Failed { kind, message } => Some(humanize_failure(kind, message)),
    }
}

fn humanize_failure(kind: &FailureKind, detail: &str) -> HumanError {
    match kind {
        FailureKind::Unreachable => HumanError {
            message: "We couldn't open the other app.".into(),
            suggestion: "Make sure the app is installed, or try again to use the in-app browser instead.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        FailureKind::Superseded => HumanError {
            message: "A newer request replaced this one.".into(),
            suggestion: "Only the most recent request continues; no action is needed.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FailureKind::Malformed => HumanError {
            message: "The reply from the other app couldn't be read.".into(),
            suggestion: "Try the request again. If this keeps happening, the other app may need an update.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FailureKind::Remote { code } => HumanError {
            message: "The other app reported a problem.".into(),
            suggestion: format!("{detail} (code {code})"),
            retriable: true,
            severity: Severity::ActionRequired,
        },
    }
}

/// Map an API-surface [`SchleuseError`] to a `HumanError`.
///
/// These are integration mistakes rather than user-facing flow outcomes, so
/// most are permanent from the user's point of view.
pub fn humanize_error(err: &SchleuseError) -> HumanError {
    match err {
        SchleuseError::InvalidRequest(detail) | SchleuseError::InvalidConfig(detail) => {
            HumanError {
                message: "This request can't be made.".into(),
                suggestion: format!("This looks like an app problem, not something you did. ({detail})"),
                retriable: false,
                severity: Severity::Permanent,
            }
        }

        SchleuseError::UrlConstruction(detail) => HumanError {
            message: "The request couldn't be prepared.".into(),
            suggestion: format!("This looks like an app problem. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        SchleuseError::Opener(detail) => HumanError {
            message: "We couldn't hand over to the other app.".into(),
            suggestion: format!("Try again in a moment. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        SchleuseError::PlatformUnavailable => HumanError {
            message: "This device can't open other apps this way.".into(),
            suggestion: "This feature needs a phone or tablet.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SchleuseError::Serialization(detail) => HumanError {
            message: "Settings couldn't be read.".into(),
            suggestion: format!("Reinstalling the app may help. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
