// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory recording opener.
//
// An honest stand-in for the platform opener: it records what it was asked
// to open and either answers immediately (success or failure) or captures
// the completion so a test can fire it later, the way a real app-switch
// completes long after the call returns.

use std::sync::Mutex;

use url::Url;

use schleuse_core::error::SchleuseError;

use crate::opener::{OpenCompletion, PresentationHost, UrlOpener};

/// How the recording opener answers an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBehavior {
    /// Report `did_open = true` immediately.
    ReportSuccess,
    /// Report `did_open = false` immediately (peer could not be launched).
    ReportFailure,
    /// Hold the completion; the caller fires it via [`RecordingOpener::take_completion`].
    Capture,
}

#[derive(Default)]
struct Recorded {
    last_url: Option<Url>,
    last_open_was_browser: Option<bool>,
    saw_presentation_host: bool,
    open_count: usize,
    browser_open_count: usize,
    captured: Option<OpenCompletion>,
}

/// Recording opener for tests and headless integration checks.
pub struct RecordingOpener {
    can_open: Mutex<bool>,
    behavior: Mutex<OpenBehavior>,
    recorded: Mutex<Recorded>,
}

impl RecordingOpener {
    /// A reachable peer that opens successfully.
    pub fn new() -> Self {
        Self {
            can_open: Mutex::new(true),
            behavior: Mutex::new(OpenBehavior::ReportSuccess),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Make the feasibility check answer `answer` from now on.
    pub fn set_can_open(&self, answer: bool) {
        *self.can_open.lock().expect("can_open lock") = answer;
    }

    /// Change how subsequent opens are answered.
    pub fn set_behavior(&self, behavior: OpenBehavior) {
        *self.behavior.lock().expect("behavior lock") = behavior;
    }

    /// The URL most recently passed to either open operation.
    pub fn last_url(&self) -> Option<Url> {
        self.recorded.lock().expect("recorded lock").last_url.clone()
    }

    /// Whether the most recent open used the browser surface.
    pub fn last_open_was_browser(&self) -> Option<bool> {
        self.recorded
            .lock()
            .expect("recorded lock")
            .last_open_was_browser
    }

    /// Whether any browser open carried a presentation host.
    pub fn saw_presentation_host(&self) -> bool {
        self.recorded
            .lock()
            .expect("recorded lock")
            .saw_presentation_host
    }

    /// Total number of open calls, either transport.
    pub fn open_count(&self) -> usize {
        self.recorded.lock().expect("recorded lock").open_count
    }

    /// Number of browser-surface opens.
    pub fn browser_open_count(&self) -> usize {
        self.recorded.lock().expect("recorded lock").browser_open_count
    }

    /// Take a completion captured under [`OpenBehavior::Capture`].
    pub fn take_completion(&self) -> Option<OpenCompletion> {
        self.recorded.lock().expect("recorded lock").captured.take()
    }

    fn record_and_answer(&self, url: &Url, browser: bool, completion: OpenCompletion) {
        let behavior = *self.behavior.lock().expect("behavior lock");
        {
            let mut recorded = self.recorded.lock().expect("recorded lock");
            recorded.last_url = Some(url.clone());
            recorded.last_open_was_browser = Some(browser);
            recorded.open_count += 1;
            if browser {
                recorded.browser_open_count += 1;
            }
            if behavior == OpenBehavior::Capture {
                recorded.captured = Some(completion);
                return;
            }
        }
        // Answer outside the lock, like a real opener would.
        if behavior == OpenBehavior::ReportSuccess {
            completion(true, None);
        } else {
            completion(
                false,
                Some(SchleuseError::Opener("simulated open failure".into())),
            );
        }
    }
}

impl Default for RecordingOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlOpener for RecordingOpener {
    fn can_open(&self, _url: &Url) -> bool {
        *self.can_open.lock().expect("can_open lock")
    }

    fn open_url(&self, url: &Url, completion: OpenCompletion) {
        self.record_and_answer(url, false, completion);
    }

    fn open_in_browser_surface(
        &self,
        url: &Url,
        from: Option<&dyn PresentationHost>,
        completion: OpenCompletion,
    ) {
        if from.is_some() {
            self.recorded
                .lock()
                .expect("recorded lock")
                .saw_presentation_host = true;
        }
        self.record_and_answer(url, true, completion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn url() -> Url {
        Url::parse("scheme://share?correlationToken=t").expect("url")
    }

    #[test]
    fn records_urls_and_transport() {
        let opener = RecordingOpener::new();
        opener.open_url(&url(), Box::new(|did_open, _| assert!(did_open)));

        assert_eq!(opener.last_url(), Some(url()));
        assert_eq!(opener.last_open_was_browser(), Some(false));
        assert_eq!(opener.open_count(), 1);
        assert_eq!(opener.browser_open_count(), 0);
    }

    #[test]
    fn captured_completion_fires_later() {
        let opener = RecordingOpener::new();
        opener.set_behavior(OpenBehavior::Capture);

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        opener.open_in_browser_surface(
            &url(),
            None,
            Box::new(move |did_open, _| {
                assert!(did_open);
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let completion = opener.take_completion().expect("captured");
        completion(true, None);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // One-shot: nothing left to take.
        assert!(opener.take_completion().is_none());
    }

    #[test]
    fn failure_behavior_reports_error() {
        let opener = RecordingOpener::new();
        opener.set_behavior(OpenBehavior::ReportFailure);

        opener.open_url(
            &url(),
            Box::new(|did_open, error| {
                assert!(!did_open);
                assert!(error.is_some());
            }),
        );
    }
}
