// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS opener via objc2.
//
// Requires compilation with the iOS SDK (Xcode). App-switching goes through
// `UIApplication` and the in-app browser surface is an
// `SFSafariViewController` presented over the key window's root view
// controller.
//
// All UIKit interactions require the main thread; operations called
// off-main report open failure rather than crossing threads. The browser
// surface is always anchored on the root view controller. UIKit view
// controllers are not `Send`, so they cannot travel through the
// `PresentationHost` handle.

#![cfg(target_os = "ios")]

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Bool};
use objc2::{msg_send, MainThreadMarker};
use objc2_foundation::{NSString, NSURL};
use objc2_ui_kit::{UIApplication, UIViewController};
use url::Url;

use schleuse_core::error::SchleuseError;

use crate::opener::{OpenCompletion, PresentationHost, UrlOpener};

/// Obtain the root `UIViewController` from the key window.
///
/// Uses the deprecated `keyWindow` property for broad iOS-version compat.
fn root_view_controller(mtm: MainThreadMarker) -> Option<Retained<UIViewController>> {
    let app = UIApplication::sharedApplication(mtm);

    // SAFETY: msg_send! to well-known UIApplication selectors (keyWindow,
    // rootViewController). MainThreadMarker guarantees we are on the main
    // thread.
    unsafe {
        let window: Option<Retained<AnyObject>> = msg_send![&app, keyWindow];
        window.and_then(|w| msg_send![&w, rootViewController])
    }
}

/// Convert an outbound `Url` into an `NSURL`.
fn ns_url(url: &Url) -> Option<Retained<NSURL>> {
    let ns_string = NSString::from_str(url.as_str());
    // SAFETY: URLWithString: is a documented NSURL class method; returns nil
    // for strings that are not valid URLs, which `Option` absorbs.
    unsafe { msg_send![objc2::class!(NSURL), URLWithString: &*ns_string] }
}

/// Concrete iOS opener.
///
/// Zero-sized; all state lives in UIKit.
pub struct IosOpener;

impl IosOpener {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IosOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlOpener for IosOpener {
    /// Whether a peer application claims `url`'s scheme.
    ///
    /// Requires the scheme to be declared under `LSApplicationQueriesSchemes`
    /// in the host's Info.plist, or UIKit answers `false` regardless.
    fn can_open(&self, url: &Url) -> bool {
        let Some(mtm) = MainThreadMarker::new() else {
            tracing::warn!("can_open called off the main thread");
            return false;
        };
        let Some(ns) = ns_url(url) else {
            return false;
        };

        let app = UIApplication::sharedApplication(mtm);
        // SAFETY: canOpenURL: is a documented UIApplication selector; main
        // thread guaranteed by the marker above.
        let can: Bool = unsafe { msg_send![&app, canOpenURL: &*ns] };
        can.as_bool()
    }

    fn open_url(&self, url: &Url, completion: OpenCompletion) {
        let Some(mtm) = MainThreadMarker::new() else {
            completion(
                false,
                Some(SchleuseError::Opener("open_url requires the main thread".into())),
            );
            return;
        };
        let Some(ns) = ns_url(url) else {
            completion(
                false,
                Some(SchleuseError::Opener(format!("not an NSURL: {url}"))),
            );
            return;
        };

        tracing::info!(%url, "iOS: opening URL via UIApplication");

        let app = UIApplication::sharedApplication(mtm);
        // SAFETY: openURL: is the synchronous UIApplication open call, kept
        // for broad iOS-version compat; returns whether the switch began.
        let opened: Bool = unsafe { msg_send![&app, openURL: &*ns] };

        if opened.as_bool() {
            completion(true, None);
        } else {
            completion(
                false,
                Some(SchleuseError::Opener("UIApplication refused to open the URL".into())),
            );
        }
    }

    fn open_in_browser_surface(
        &self,
        url: &Url,
        _from: Option<&dyn PresentationHost>,
        completion: OpenCompletion,
    ) {
        let Some(mtm) = MainThreadMarker::new() else {
            completion(
                false,
                Some(SchleuseError::Opener(
                    "open_in_browser_surface requires the main thread".into(),
                )),
            );
            return;
        };
        let Some(ns) = ns_url(url) else {
            completion(
                false,
                Some(SchleuseError::Opener(format!("not an NSURL: {url}"))),
            );
            return;
        };
        let Some(root_vc) = root_view_controller(mtm) else {
            completion(
                false,
                Some(SchleuseError::Opener("no root view controller available".into())),
            );
            return;
        };

        tracing::info!(%url, "iOS: presenting SFSafariViewController");

        // SAFETY: ObjC alloc+init pattern for SFSafariViewController
        // (SafariServices.framework, linked automatically on iOS 9+).
        // initWithURL: takes an NSURL.
        let safari_vc: Retained<UIViewController> = unsafe {
            let alloc: Retained<AnyObject> =
                msg_send![objc2::class!(SFSafariViewController), alloc];
            msg_send![&alloc, initWithURL: &*ns]
        };

        // SAFETY: presentViewController:animated:completion: is a documented
        // UIViewController method; main thread guaranteed above.
        unsafe {
            root_vc.presentViewController_animated_completion(&safari_vc, true, None);
        }

        completion(true, None);
    }
}
