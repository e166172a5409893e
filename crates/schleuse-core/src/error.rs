// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Schleuse.
//
// These are API-surface errors returned as `Result`. Protocol outcomes
// (success, cancellation, remote failure) are never `Err`; they arrive
// through the completion callback as a `BridgeResponse`.

use thiserror::Error;

/// Top-level error type for all Schleuse operations.
#[derive(Debug, Error)]
pub enum SchleuseError {
    // -- Request / configuration --
    #[error("invalid bridge request: {0}")]
    InvalidRequest(String),

    #[error("invalid bridge configuration: {0}")]
    InvalidConfig(String),

    #[error("outbound URL construction failed: {0}")]
    UrlConstruction(String),

    // -- Platform opener --
    #[error("opener error: {0}")]
    Opener(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Serialization --
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SchleuseError>;
