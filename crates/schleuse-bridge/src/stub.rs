// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub opener for desktop/CI builds where app-switching is unavailable.
//
// Every open reports failure; real implementations live in the `ios` and
// `android` modules.

use url::Url;

use schleuse_core::error::SchleuseError;

use crate::opener::{OpenCompletion, PresentationHost, UrlOpener};

/// No-op opener returned on non-mobile platforms.
pub struct StubOpener;

impl UrlOpener for StubOpener {
    fn can_open(&self, _url: &Url) -> bool {
        false
    }

    fn open_url(&self, url: &Url, completion: OpenCompletion) {
        tracing::warn!(%url, "UrlOpener::open_url called on stub opener");
        completion(false, Some(SchleuseError::PlatformUnavailable));
    }

    fn open_in_browser_surface(
        &self,
        url: &Url,
        _from: Option<&dyn PresentationHost>,
        completion: OpenCompletion,
    ) {
        tracing::warn!(%url, "UrlOpener::open_in_browser_surface called on stub opener");
        completion(false, Some(SchleuseError::PlatformUnavailable));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn stub_reports_open_failure() {
        let opener = StubOpener;
        let url = Url::parse("scheme://share?correlationToken=t").expect("url");

        assert!(!opener.can_open(&url));

        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        opener.open_url(
            &url,
            Box::new(move |did_open, error| {
                assert!(!did_open);
                assert!(matches!(error, Some(SchleuseError::PlatformUnavailable)));
                fired_clone.store(true, Ordering::SeqCst);
            }),
        );
        assert!(fired.load(Ordering::SeqCst));
    }
}
