// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Schleuse — host-side policy around the bridge core: resume-event
// dispatch, watchdog timeouts, and logging setup. Everything here is
// optional; the bridge controller is fully usable without it.

pub mod lifecycle;
pub mod telemetry;
pub mod watchdog;

pub use lifecycle::{ResumeDispatcher, ResumeEvent};
pub use telemetry::init_tracing;
pub use watchdog::ResumeWatchdog;
