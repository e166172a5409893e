// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outbound URL construction.
//
// Shape: `scheme://action?correlationToken=<token>&<url-encoded parameters>`.
// Spaces encode as `%20`; a literal `+` stays `+`. The parser on the return
// side applies the same convention, so payloads survive the round trip
// byte-for-byte.

use url::Url;

use schleuse_core::config::BridgeConfig;
use schleuse_core::error::{Result, SchleuseError};
use schleuse_core::types::BridgeRequest;

use crate::params;

/// Build the outbound URL for `request` under `config`.
///
/// The correlation token and (when set) the method version are appended
/// first, followed by caller parameters in key order.
///
/// # Errors
///
/// - [`SchleuseError::InvalidConfig`] when the configured scheme is not a
///   legal URL scheme.
/// - [`SchleuseError::InvalidRequest`] when a caller parameter collides
///   with a reserved protocol key.
/// - [`SchleuseError::UrlConstruction`] when scheme + action do not form a
///   parseable URL.
pub fn build_outbound_url(config: &BridgeConfig, request: &BridgeRequest) -> Result<Url> {
    config.validate()?;

    if let Some(key) = request.parameters().keys().find(|k| params::is_reserved(k.as_str())) {
        return Err(SchleuseError::InvalidRequest(format!(
            "parameter name `{key}` is reserved by the bridge protocol"
        )));
    }

    let base = format!("{}://{}", config.scheme, request.action());
    let mut url = Url::parse(&base)
        .map_err(|e| SchleuseError::UrlConstruction(format!("{base}: {e}")))?;

    let mut query = String::new();
    push_pair(
        &mut query,
        params::CORRELATION_TOKEN,
        &request.token().to_string(),
    );

    let version = request
        .method_version()
        .or(config.default_method_version.as_deref());
    if let Some(version) = version {
        push_pair(&mut query, params::METHOD_VERSION, version);
    }

    for (key, value) in request.parameters() {
        push_pair(&mut query, key, value);
    }

    url.set_query(Some(&query));
    Ok(url)
}

/// Append one `key=value` pair, percent-encoding both sides.
fn push_pair(query: &mut String, key: &str, value: &str) {
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(&urlencoding::encode(key));
    query.push('=');
    query.push_str(&urlencoding::encode(value));
}
