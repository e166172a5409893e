// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tracing initialisation for hosts that have no logging setup of their own.

/// Initialise the global tracing subscriber.
///
/// Respects `RUST_LOG`, defaulting to `info`. Call at most once, early in
/// host startup; embedding hosts with their own subscriber should skip
/// this entirely.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
