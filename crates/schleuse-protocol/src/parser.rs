// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Return URL parsing, the pure half of the bridge.
//
// A return URL carries its payload in the query string, or in the fragment
// for surfaces that cannot set a query. Both are read; on duplicate keys the
// query wins. Anything that fails to decode produces `Failed { Malformed }`
// rather than a panic or a partial result.

use url::Url;

use schleuse_core::types::{BridgeResponse, CorrelationToken, FailureKind, Parameters};

use crate::params;

/// Cheaply pull the raw correlation token out of a candidate return URL.
///
/// The controller uses this to decide whether the URL belongs to the pending
/// request at all, before committing to a full parse. Returns `None` when
/// the URL carries no readable token.
pub fn extract_token(url: &Url) -> Option<String> {
    collect_pairs(url)?
        .into_iter()
        .find(|(key, _)| key == params::CORRELATION_TOKEN)
        .map(|(_, value)| value)
}

/// Parse a return URL into a [`BridgeResponse`].
///
/// The caller (the bridge controller) already filters on the correlation
/// token; the token is re-checked here and a mismatch fails closed with
/// `Malformed`.
///
/// Precedence: an explicit remote error beats the cancel flag beats success.
pub fn parse_return_url(url: &Url, expected_token: &CorrelationToken) -> BridgeResponse {
    let Some(pairs) = collect_pairs(url) else {
        tracing::debug!("return URL carried undecodable parameters");
        return BridgeResponse::failed(FailureKind::Malformed, "undecodable return parameters");
    };

    let lookup = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    match lookup(params::CORRELATION_TOKEN) {
        None => {
            return BridgeResponse::failed(FailureKind::Malformed, "missing correlation token");
        }
        Some(token) if token != expected_token.to_string() => {
            tracing::debug!("return URL token does not match the expected token");
            return BridgeResponse::failed(FailureKind::Malformed, "correlation token mismatch");
        }
        Some(_) => {}
    }

    if let Some(code) = lookup(params::ERROR_CODE) {
        let message = lookup(params::ERROR_MESSAGE).unwrap_or_default();
        return BridgeResponse::failed(FailureKind::Remote { code: code.into() }, message);
    }

    if lookup(params::CANCEL).is_some_and(is_truthy) {
        return BridgeResponse::Cancelled;
    }

    let mut parameters = Parameters::new();
    for (key, value) in pairs {
        if !params::is_reserved(&key) {
            // First occurrence wins; query pairs come before fragment pairs.
            parameters.entry(key).or_insert(value);
        }
    }
    BridgeResponse::Success { parameters }
}

/// Truthy values for the cancel flag.
fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Decode query pairs, then fragment pairs. `None` when any pair is
/// percent-encoded to invalid UTF-8.
fn collect_pairs(url: &Url) -> Option<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for raw in [url.query(), url.fragment()].into_iter().flatten() {
        decode_into(raw, &mut pairs)?;
    }
    Some(pairs)
}

/// Decode one `a=1&b=2` string, appending to `pairs`.
fn decode_into(raw: &str, pairs: &mut Vec<(String, String)>) -> Option<()> {
    for piece in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
        let key = urlencoding::decode(key).ok()?;
        let value = urlencoding::decode(value).ok()?;
        pairs.push((key.into_owned(), value.into_owned()));
    }
    Some(())
}
