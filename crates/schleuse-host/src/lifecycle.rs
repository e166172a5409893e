// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resume-event dispatch.
//
// Platforms deliver "the app is back" through wildly different mechanisms
// (openURL callbacks, onNewIntent, scene activation). The dispatcher
// normalises all of them into two events and feeds the controller's resume
// entry points from a single task, keeping slot mutations on one logical
// thread the way the bridge's concurrency model assumes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use schleuse_bridge::BridgeController;

/// A host lifecycle notification relevant to the bridge.
#[derive(Debug, Clone)]
pub enum ResumeEvent {
    /// The application regained control with a candidate return URL.
    ReturnUrl(Url),
    /// The application regained control empty-handed (the user dismissed
    /// the external surface).
    NoUrl,
}

/// Routes [`ResumeEvent`]s to a [`BridgeController`].
pub struct ResumeDispatcher {
    tx: mpsc::UnboundedSender<ResumeEvent>,
    task: JoinHandle<()>,
}

impl ResumeDispatcher {
    /// Spawn the dispatch task for `controller`.
    pub fn spawn(controller: Arc<BridgeController>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ResumeEvent>();

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    ResumeEvent::ReturnUrl(url) => {
                        let consumed = controller.handle_resume(&url);
                        debug!(%url, consumed, "resume URL dispatched");
                    }
                    ResumeEvent::NoUrl => controller.handle_resume_without_url(),
                }
            }
        });

        Self { tx, task }
    }

    /// Queue an event. Returns `false` when the dispatcher has shut down.
    pub fn notify(&self, event: ResumeEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// A sender for platform glue that outlives this handle.
    pub fn sender(&self) -> mpsc::UnboundedSender<ResumeEvent> {
        self.tx.clone()
    }

    /// Drain queued events and stop.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use schleuse_bridge::memory::RecordingOpener;
    use schleuse_core::config::BridgeConfig;
    use schleuse_core::types::{BridgeRequest, BridgeResponse, Parameters, TransportPreference};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn controller() -> Arc<BridgeController> {
        Arc::new(
            BridgeController::new(BridgeConfig::new("scheme"), Arc::new(RecordingOpener::new()))
                .expect("controller"),
        )
    }

    #[tokio::test]
    async fn return_url_events_resolve_the_pending_request() {
        let controller = controller();
        let responses = Arc::new(Mutex::new(Vec::new()));
        let count = Arc::new(AtomicUsize::new(0));

        let responses_clone = Arc::clone(&responses);
        let count_clone = Arc::clone(&count);
        controller
            .open(
                BridgeRequest::new("share", Parameters::new()).expect("request"),
                TransportPreference::NativeApp,
                Box::new(move |response| {
                    count_clone.fetch_add(1, Ordering::SeqCst);
                    responses_clone.lock().expect("responses").push(response);
                }),
            )
            .expect("open");
        let token = controller.pending_token().expect("token");

        let dispatcher = ResumeDispatcher::spawn(Arc::clone(&controller));
        let url = Url::parse(&format!("scheme://share?correlationToken={token}&a=1"))
            .expect("url");
        assert!(dispatcher.notify(ResumeEvent::ReturnUrl(url)));
        dispatcher.shutdown().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(matches!(
            responses.lock().expect("responses").last(),
            Some(BridgeResponse::Success { .. })
        ));
    }

    #[tokio::test]
    async fn no_url_events_cancel_the_pending_request() {
        let controller = controller();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        controller
            .open(
                BridgeRequest::new("share", Parameters::new()).expect("request"),
                TransportPreference::NativeApp,
                Box::new(move |response| {
                    assert_eq!(response, BridgeResponse::Cancelled);
                    count_clone.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .expect("open");

        let dispatcher = ResumeDispatcher::spawn(Arc::clone(&controller));
        assert!(dispatcher.notify(ResumeEvent::NoUrl));
        dispatcher.shutdown().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!controller.has_pending());
    }

    #[tokio::test]
    async fn notify_after_shutdown_reports_failure() {
        let controller = controller();
        let dispatcher = ResumeDispatcher::spawn(Arc::clone(&controller));
        let sender = dispatcher.sender();
        dispatcher.shutdown().await;

        assert!(sender.send(ResumeEvent::NoUrl).is_err());
    }
}
