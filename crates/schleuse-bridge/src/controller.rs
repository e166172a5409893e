// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge controller: tracks the single in-flight request across an
// app-switch and resolves it exactly once.
//
// The whole component is one guarded slot: `Idle | Pending(PendingRequest)`.
// Every resolution path *takes* the pending request out of the slot under
// the lock and invokes its completion after the lock is released, so the
// slot is already `Idle` by the time user code runs. Double resolution is
// unrepresentable: the completion is `FnOnce` and lives inside the value
// that was taken.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use url::Url;

use schleuse_core::config::BridgeConfig;
use schleuse_core::error::Result;
use schleuse_core::types::{
    BridgeRequest, BridgeResponse, CorrelationToken, FailureKind, Transport, TransportPreference,
};
use schleuse_protocol::{build_outbound_url, extract_token, parse_return_url};

use crate::opener::{OpenCompletion, PresentationHost, UrlOpener};

/// One-shot callback through which every terminal outcome is delivered.
pub type CompletionHandler = Box<dyn FnOnce(BridgeResponse) + Send>;

/// The single tracked in-flight request awaiting resolution.
pub struct PendingRequest {
    request: BridgeRequest,
    transport: Transport,
    created_at: DateTime<Utc>,
    completion: CompletionHandler,
}

impl PendingRequest {
    pub fn token(&self) -> CorrelationToken {
        self.request.token()
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Deliver the terminal outcome. Consumes the request, so resolving
    /// twice does not typecheck.
    fn resolve(self, response: BridgeResponse) {
        info!(
            token = %self.request.token(),
            action = self.request.action(),
            transport = ?self.transport,
            outcome = variant_name(&response),
            "pending request resolved"
        );
        (self.completion)(response);
    }
}

fn variant_name(response: &BridgeResponse) -> &'static str {
    match response {
        BridgeResponse::Success { .. } => "success",
        BridgeResponse::Cancelled => "cancelled",
        BridgeResponse::Failed { .. } => "failed",
    }
}

/// Tagged pending-request slot. At most one request is ever in flight.
enum PendingSlot {
    Idle,
    Pending(PendingRequest),
}

/// Orchestrator of the open/await/resolve protocol.
///
/// `open` hands control to the external surface; one of the four resolution
/// paths (matching resume, no-URL resume, explicit cancel, open failure)
/// later fires the completion exactly once. The controller is cheap to
/// clone-share via the `Arc` it holds internally and never blocks: the only
/// waiting in the system happens outside the application.
pub struct BridgeController {
    config: BridgeConfig,
    opener: Arc<dyn UrlOpener>,
    presentation_host: Option<Arc<dyn PresentationHost>>,
    slot: Arc<Mutex<PendingSlot>>,
}

impl BridgeController {
    /// Create a controller over the given opener.
    ///
    /// # Errors
    ///
    /// Returns [`schleuse_core::SchleuseError::InvalidConfig`] when the
    /// configured scheme is not a legal URL scheme.
    pub fn new(config: BridgeConfig, opener: Arc<dyn UrlOpener>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            opener,
            presentation_host: None,
            slot: Arc::new(Mutex::new(PendingSlot::Idle)),
        })
    }

    /// Anchor browser-surface presentations over `host`.
    pub fn with_presentation_host(mut self, host: Arc<dyn PresentationHost>) -> Self {
        self.presentation_host = Some(host);
        self
    }

    /// Hand `request` to the external surface.
    ///
    /// A request already in flight is first resolved with
    /// `Failed { Superseded }`, never silently dropped. The native
    /// transport is used only when `preference` asks for it and the
    /// opener's feasibility check agrees; otherwise the in-app browser
    /// surface carries the same URL.
    ///
    /// # Errors
    ///
    /// Returns an error (and does **not** consume `completion`) when the
    /// outbound URL cannot be constructed. The in-flight request, if any,
    /// is left untouched in that case.
    #[instrument(skip(self, request, completion), fields(action = request.action(), token = %request.token()))]
    pub fn open(
        &self,
        request: BridgeRequest,
        preference: TransportPreference,
        completion: CompletionHandler,
    ) -> Result<()> {
        let url = build_outbound_url(&self.config, &request)?;

        let transport = self.select_transport(&url, preference);
        let token = request.token();
        let pending = PendingRequest {
            request,
            transport,
            created_at: Utc::now(),
            completion,
        };

        // Register the new request and evict the old one in one critical
        // section, then resolve the evicted request outside the lock.
        let superseded = {
            let mut slot = self.lock();
            std::mem::replace(&mut *slot, PendingSlot::Pending(pending))
        };
        if let PendingSlot::Pending(old) = superseded {
            warn!(old_token = %old.token(), "pending request superseded by a new open");
            old.resolve(BridgeResponse::failed(
                FailureKind::Superseded,
                "a newer bridge request preempted this one",
            ));
        }

        debug!(%url, ?transport, "opening outbound URL");

        // If the open itself fails the request resolves immediately; the
        // token guard makes a late failure callback harmless once a
        // successor occupies the slot.
        let slot = Arc::clone(&self.slot);
        let on_open: OpenCompletion = Box::new(move |did_open, error| {
            if did_open {
                debug!(%token, "external surface opened; awaiting resume");
                return;
            }
            let message = match error {
                Some(e) => format!("open failed: {e}"),
                None => "open failed".into(),
            };
            if let Some(pending) = take_matching(&slot, token) {
                pending.resolve(BridgeResponse::failed(FailureKind::Unreachable, message));
            }
        });

        match transport {
            Transport::NativeApp => self.opener.open_url(&url, on_open),
            Transport::BrowserSurface => self.opener.open_in_browser_surface(
                &url,
                self.presentation_host.as_deref(),
                on_open,
            ),
        }
        Ok(())
    }

    /// Offer a candidate return URL to the pending request.
    ///
    /// Returns `false` (leaving any pending request untouched) when the
    /// bridge is idle, when the URL is not on the configured scheme, or
    /// when its correlation token does not match. A foreign callback must
    /// not be consumed, and must never corrupt bridge state.
    #[instrument(skip(self, url))]
    pub fn handle_resume(&self, url: &Url) -> bool {
        if url.scheme() != self.config.scheme {
            debug!(scheme = url.scheme(), "resume URL is not on the bridge scheme");
            return false;
        }

        let pending = {
            let mut slot = self.lock();
            match std::mem::replace(&mut *slot, PendingSlot::Idle) {
                PendingSlot::Idle => return false,
                PendingSlot::Pending(pending) => {
                    let matches = extract_token(url)
                        .is_some_and(|t| t == pending.token().to_string());
                    if !matches {
                        debug!("resume URL token does not match the pending request");
                        *slot = PendingSlot::Pending(pending);
                        return false;
                    }
                    pending
                }
            }
        };

        let response = parse_return_url(url, &pending.token());
        pending.resolve(response);
        true
    }

    /// The application regained control with no return URL: the user
    /// dismissed the external surface without completing the flow.
    #[instrument(skip(self))]
    pub fn handle_resume_without_url(&self) {
        if let Some(pending) = self.take_any() {
            pending.resolve(BridgeResponse::Cancelled);
        }
    }

    /// Explicitly abandon the pending request, resolving it with
    /// `Cancelled`, or `Failed { reason }` when a reason is supplied.
    /// No-op when idle.
    #[instrument(skip(self))]
    pub fn cancel_pending(&self, reason: Option<FailureKind>) {
        if let Some(pending) = self.take_any() {
            let response = match reason {
                None => BridgeResponse::Cancelled,
                Some(kind) => {
                    BridgeResponse::failed(kind, "bridge request cancelled by the host")
                }
            };
            pending.resolve(response);
        }
    }

    /// Cancel only if `token` is still the one in flight. Lets an external
    /// watchdog expire exactly the request it was armed for, never a
    /// successor. Returns whether anything was cancelled.
    pub fn cancel_pending_matching(
        &self,
        token: CorrelationToken,
        reason: Option<FailureKind>,
    ) -> bool {
        match take_matching(&self.slot, token) {
            Some(pending) => {
                let response = match reason {
                    None => BridgeResponse::Cancelled,
                    Some(kind) => {
                        BridgeResponse::failed(kind, "bridge request expired by the host")
                    }
                };
                pending.resolve(response);
                true
            }
            None => false,
        }
    }

    /// Whether a request is currently awaiting resolution.
    pub fn has_pending(&self) -> bool {
        matches!(&*self.lock(), PendingSlot::Pending(_))
    }

    /// Token of the request in flight, if any.
    pub fn pending_token(&self) -> Option<CorrelationToken> {
        match &*self.lock() {
            PendingSlot::Pending(pending) => Some(pending.token()),
            PendingSlot::Idle => None,
        }
    }

    /// When the request in flight was opened, if any.
    pub fn pending_since(&self) -> Option<DateTime<Utc>> {
        match &*self.lock() {
            PendingSlot::Pending(pending) => Some(pending.created_at),
            PendingSlot::Idle => None,
        }
    }

    fn select_transport(&self, url: &Url, preference: TransportPreference) -> Transport {
        match preference {
            TransportPreference::NativeApp if self.opener.can_open(url) => Transport::NativeApp,
            TransportPreference::NativeApp => {
                debug!("native peer unreachable; falling back to browser surface");
                Transport::BrowserSurface
            }
            TransportPreference::BrowserSurface => Transport::BrowserSurface,
        }
    }

    fn take_any(&self) -> Option<PendingRequest> {
        let mut slot = self.lock();
        match std::mem::replace(&mut *slot, PendingSlot::Idle) {
            PendingSlot::Idle => None,
            PendingSlot::Pending(pending) => Some(pending),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PendingSlot> {
        // The lock is only ever held for slot swaps; a poisoned lock means
        // a panic mid-swap, which nothing can recover from.
        self.slot.lock().expect("pending-slot mutex poisoned")
    }
}

/// Take the pending request out of `slot` only when its token matches.
fn take_matching(
    slot: &Arc<Mutex<PendingSlot>>,
    token: CorrelationToken,
) -> Option<PendingRequest> {
    let mut slot = slot.lock().expect("pending-slot mutex poisoned");
    match std::mem::replace(&mut *slot, PendingSlot::Idle) {
        PendingSlot::Idle => None,
        PendingSlot::Pending(pending) if pending.token() == token => Some(pending),
        PendingSlot::Pending(other) => {
            *slot = PendingSlot::Pending(other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use schleuse_core::types::Parameters;

    use crate::memory::{OpenBehavior, RecordingOpener};

    /// Collects every response delivered to a completion, and counts them.
    #[derive(Default)]
    struct Outcome {
        responses: StdMutex<Vec<BridgeResponse>>,
        count: AtomicUsize,
    }

    impl Outcome {
        fn handler(outcome: &Arc<Self>) -> CompletionHandler {
            let this = Arc::clone(outcome);
            Box::new(move |response| {
                this.count.fetch_add(1, Ordering::SeqCst);
                this.responses.lock().expect("responses").push(response);
            })
        }

        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }

        fn last(&self) -> Option<BridgeResponse> {
            self.responses.lock().expect("responses").last().cloned()
        }
    }

    fn make_controller() -> (BridgeController, Arc<RecordingOpener>) {
        let opener = Arc::new(RecordingOpener::new());
        let controller = BridgeController::new(BridgeConfig::new("scheme"), opener.clone())
            .expect("controller");
        (controller, opener)
    }

    fn request(action: &str) -> BridgeRequest {
        BridgeRequest::new(action, Parameters::new()).expect("request")
    }

    fn return_url(token: CorrelationToken, suffix: &str) -> Url {
        Url::parse(&format!("scheme://share?correlationToken={token}{suffix}")).expect("url")
    }

    #[test]
    fn dismissal_without_url_resolves_cancelled() {
        let (controller, _opener) = make_controller();
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        assert!(controller.has_pending());

        controller.handle_resume_without_url();

        assert_eq!(outcome.count(), 1);
        assert_eq!(outcome.last(), Some(BridgeResponse::Cancelled));
        assert!(!controller.has_pending());
    }

    #[test]
    fn matching_resume_with_remote_error_resolves_failed() {
        let (controller, _opener) = make_controller();
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        let token = controller.pending_token().expect("token");

        let consumed =
            controller.handle_resume(&return_url(token, "&error_code=4&error_message=denied"));

        assert!(consumed);
        assert_eq!(outcome.count(), 1);
        assert_eq!(
            outcome.last(),
            Some(BridgeResponse::failed(
                FailureKind::Remote { code: "4".into() },
                "denied"
            ))
        );
    }

    #[test]
    fn matching_resume_with_payload_resolves_success() {
        let (controller, _opener) = make_controller();
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        let token = controller.pending_token().expect("token");

        assert!(controller.handle_resume(&return_url(token, "&a=1&b=x%20y")));

        let mut expected = Parameters::new();
        expected.insert("a".into(), "1".into());
        expected.insert("b".into(), "x y".into());
        assert_eq!(
            outcome.last(),
            Some(BridgeResponse::Success { parameters: expected })
        );
    }

    #[test]
    fn foreign_token_is_not_consumed_and_leaves_pending_intact() {
        let (controller, _opener) = make_controller();
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        let token = controller.pending_token().expect("token");

        let foreign = Url::parse("scheme://share?correlationToken=somebody-else&a=1")
            .expect("url");
        assert!(!controller.handle_resume(&foreign));

        // Untouched: still pending, nothing delivered, and a real resume
        // still works.
        assert_eq!(outcome.count(), 0);
        assert_eq!(controller.pending_token(), Some(token));
        assert!(controller.handle_resume(&return_url(token, "&ok=1")));
        assert_eq!(outcome.count(), 1);
    }

    #[test]
    fn wrong_scheme_is_not_consumed() {
        let (controller, _opener) = make_controller();
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        let token = controller.pending_token().expect("token");

        let other_scheme =
            Url::parse(&format!("elsewhere://share?correlationToken={token}")).expect("url");
        assert!(!controller.handle_resume(&other_scheme));
        assert!(controller.has_pending());
    }

    #[test]
    fn resume_when_idle_returns_false() {
        let (controller, _opener) = make_controller();
        let url = Url::parse("scheme://share?correlationToken=t").expect("url");

        assert!(!controller.handle_resume(&url));
        controller.handle_resume_without_url(); // no-op, must not panic
        controller.cancel_pending(None); // same
    }

    #[test]
    fn second_open_supersedes_the_first() {
        let (controller, _opener) = make_controller();
        let first = Arc::new(Outcome::default());
        let second = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&first))
            .expect("open");
        controller
            .open(request("login"), TransportPreference::NativeApp, Outcome::handler(&second))
            .expect("open");

        assert_eq!(first.count(), 1);
        assert!(matches!(
            first.last(),
            Some(BridgeResponse::Failed { kind: FailureKind::Superseded, .. })
        ));

        // The second request is live and resolves normally.
        assert_eq!(second.count(), 0);
        let token = controller.pending_token().expect("token");
        assert!(controller.handle_resume(&return_url(token, "")));
        assert_eq!(second.count(), 1);
        assert_eq!(first.count(), 1);
    }

    #[test]
    fn open_failure_resolves_unreachable_and_rejects_late_resume() {
        let (controller, opener) = make_controller();
        opener.set_behavior(OpenBehavior::ReportFailure);
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");

        assert_eq!(outcome.count(), 1);
        assert!(matches!(
            outcome.last(),
            Some(BridgeResponse::Failed { kind: FailureKind::Unreachable, .. })
        ));
        assert!(!controller.has_pending());
    }

    #[test]
    fn late_open_failure_cannot_clobber_a_successor() {
        let (controller, opener) = make_controller();
        opener.set_behavior(OpenBehavior::Capture);
        let first = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&first))
            .expect("open");
        let late_completion = opener.take_completion().expect("captured");

        // A new request supersedes the first while its open is still in
        // flight.
        opener.set_behavior(OpenBehavior::ReportSuccess);
        let second = Arc::new(Outcome::default());
        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&second))
            .expect("open");
        assert_eq!(first.count(), 1); // superseded

        // The first open now reports failure, too late to touch anything.
        late_completion(false, None);
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 0);
        assert!(controller.has_pending());
    }

    #[test]
    fn native_preference_falls_back_to_browser_when_unreachable() {
        let (controller, opener) = make_controller();
        opener.set_can_open(false);
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");

        assert_eq!(opener.last_open_was_browser(), Some(true));
    }

    #[test]
    fn browser_preference_never_asks_for_native() {
        let (controller, opener) = make_controller();
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::BrowserSurface, Outcome::handler(&outcome))
            .expect("open");

        assert_eq!(opener.last_open_was_browser(), Some(true));
        assert_eq!(opener.browser_open_count(), 1);
    }

    #[test]
    fn explicit_cancel_with_reason_resolves_failed() {
        let (controller, _opener) = make_controller();
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        controller.cancel_pending(Some(FailureKind::Unreachable));

        assert!(matches!(
            outcome.last(),
            Some(BridgeResponse::Failed { kind: FailureKind::Unreachable, .. })
        ));
    }

    #[test]
    fn cancel_matching_ignores_a_successor() {
        let (controller, _opener) = make_controller();
        let first = Arc::new(Outcome::default());
        let second = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&first))
            .expect("open");
        let stale_token = controller.pending_token().expect("token");

        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&second))
            .expect("open");

        // A watchdog armed for the first request fires after supersession.
        assert!(!controller.cancel_pending_matching(stale_token, None));
        assert_eq!(second.count(), 0);
        assert!(controller.has_pending());

        let live_token = controller.pending_token().expect("token");
        assert!(controller.cancel_pending_matching(live_token, None));
        assert_eq!(second.last(), Some(BridgeResponse::Cancelled));
    }

    #[test]
    fn completion_can_reopen_immediately() {
        let (controller, opener) = make_controller();
        let controller = Arc::new(controller);
        let second = Arc::new(Outcome::default());

        // The first completion opens a follow-up request from inside the
        // callback; the slot is already idle at that point.
        let reopen = {
            let controller = Arc::clone(&controller);
            let second = Arc::clone(&second);
            Box::new(move |_response: BridgeResponse| {
                controller
                    .open(
                        request("follow-up"),
                        TransportPreference::NativeApp,
                        Outcome::handler(&second),
                    )
                    .expect("re-entrant open");
            })
        };

        controller
            .open(request("share"), TransportPreference::NativeApp, reopen)
            .expect("open");
        controller.handle_resume_without_url();

        assert!(controller.has_pending());
        assert_eq!(opener.open_count(), 2);
        assert_eq!(second.count(), 0);
    }

    #[test]
    fn every_resolution_path_fires_exactly_once() {
        // open → matching resume
        let (controller, _opener) = make_controller();
        let outcome = Arc::new(Outcome::default());
        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        let token = controller.pending_token().expect("token");
        assert!(controller.handle_resume(&return_url(token, "")));
        controller.handle_resume_without_url();
        controller.cancel_pending(None);
        assert!(!controller.handle_resume(&return_url(token, "")));
        assert_eq!(outcome.count(), 1);

        // open → cancel, then stray resumes
        let (controller, _opener) = make_controller();
        let outcome = Arc::new(Outcome::default());
        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        let token = controller.pending_token().expect("token");
        controller.cancel_pending(None);
        assert!(!controller.handle_resume(&return_url(token, "")));
        controller.handle_resume_without_url();
        assert_eq!(outcome.count(), 1);
    }

    struct TestHost;

    impl PresentationHost for TestHost {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn browser_open_carries_the_presentation_host() {
        let opener = Arc::new(RecordingOpener::new());
        let controller = BridgeController::new(BridgeConfig::new("scheme"), opener.clone())
            .expect("controller")
            .with_presentation_host(Arc::new(TestHost));
        let outcome = Arc::new(Outcome::default());

        controller
            .open(request("share"), TransportPreference::BrowserSurface, Outcome::handler(&outcome))
            .expect("open");

        assert!(opener.saw_presentation_host());
    }

    #[test]
    fn pending_since_tracks_the_open() {
        let (controller, _opener) = make_controller();
        assert!(controller.pending_since().is_none());

        let outcome = Arc::new(Outcome::default());
        let before = Utc::now();
        controller
            .open(request("share"), TransportPreference::NativeApp, Outcome::handler(&outcome))
            .expect("open");
        let since = controller.pending_since().expect("since");
        assert!(since >= before);
    }
}
