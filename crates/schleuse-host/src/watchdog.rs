// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watchdog timeout for pending bridge requests.
//
// The bridge itself never expires a request; resolution comes from resume
// notifications or explicit cancellation. A host that wants an upper bound
// layers this watchdog on top of the cancel path. The watchdog remembers
// which token it was armed for, so it can never expire a successor request.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use schleuse_bridge::BridgeController;
use schleuse_core::config::BridgeConfig;

/// Expires the pending request after a timeout, unless dropped first.
///
/// Armed for exactly one request: if that request resolves, or a new one
/// supersedes it, the eventual firing is a no-op.
pub struct ResumeWatchdog {
    task: Option<JoinHandle<()>>,
}

impl ResumeWatchdog {
    /// Arm a watchdog for the request currently in flight.
    ///
    /// Returns `None` when the bridge is idle. Dropping the returned guard
    /// disarms the watchdog; call [`detach`](Self::detach) to let it outlive
    /// the guard.
    pub fn arm(controller: Arc<BridgeController>, timeout: Duration) -> Option<Self> {
        let token = controller.pending_token()?;
        debug!(%token, ?timeout, "watchdog armed");

        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if controller.cancel_pending_matching(token, None) {
                warn!(%token, ?timeout, "pending bridge request expired");
            }
        });
        Some(Self { task: Some(task) })
    }

    /// Arm using the timeout the bridge configuration suggests.
    ///
    /// Returns `None` when the configuration suggests no timeout or the
    /// bridge is idle.
    pub fn arm_from_config(
        controller: Arc<BridgeController>,
        config: &BridgeConfig,
    ) -> Option<Self> {
        let secs = config.resume_watchdog_secs?;
        Self::arm(controller, Duration::from_secs(secs))
    }

    /// Let the watchdog run to its deadline even after the guard is gone.
    pub fn detach(mut self) {
        self.task.take();
    }
}

impl Drop for ResumeWatchdog {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
