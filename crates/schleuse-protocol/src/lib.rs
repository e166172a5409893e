// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Schleuse — URL wire codec for the app-handoff bridge.
//
// Everything here is pure: building an outbound URL and parsing a return URL
// touch no state, which is what makes the controller's correlation logic
// testable without a platform.

pub mod outbound;
pub mod params;
pub mod parser;

pub use outbound::build_outbound_url;
pub use parser::{extract_token, parse_return_url};
