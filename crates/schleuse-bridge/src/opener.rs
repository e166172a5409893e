// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic opener capability.
//
// The bridge controller consumes this interface; it never opens a URL
// itself. An opener's completion reports only whether the *open* action
// succeeded. The eventual response arrives much later, through the host's
// resume notification, and is none of the opener's business.

use std::any::Any;

use url::Url;

use schleuse_core::error::SchleuseError;

/// One-shot callback reporting the outcome of the open action itself.
///
/// Invoked exactly once, synchronously or asynchronously. `did_open = false`
/// means the app-switch or browser presentation never happened; the error,
/// when present, says why.
pub type OpenCompletion = Box<dyn FnOnce(bool, Option<SchleuseError>) + Send>;

/// Opaque handle to whatever the platform presents browser surfaces over
/// (a view controller, an activity, nothing at all on desktop).
///
/// The core never interprets it; platform adapters may downcast via
/// [`PresentationHost::as_any`].
pub trait PresentationHost: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Capability to leave the application.
pub trait UrlOpener: Send + Sync {
    /// Whether the native peer for `url` is reachable (scheme registered,
    /// peer installed). Feasibility only: a `true` here does not promise
    /// the open will succeed.
    fn can_open(&self, url: &Url) -> bool;

    /// Open `url` directly, switching to the native peer application.
    fn open_url(&self, url: &Url, completion: OpenCompletion);

    /// Open `url` inside an in-app browser surface, presented over `from`
    /// when the platform needs an anchor.
    fn open_in_browser_surface(
        &self,
        url: &Url,
        from: Option<&dyn PresentationHost>,
        completion: OpenCompletion,
    );
}
