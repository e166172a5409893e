// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Schleuse — app-handoff bridge: the opener capability and the controller
// that correlates outbound requests with return URLs.

pub mod controller;
pub mod memory;
pub mod opener;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub mod stub;

use std::sync::Arc;

pub use controller::{BridgeController, CompletionHandler, PendingRequest};
pub use opener::{OpenCompletion, PresentationHost, UrlOpener};

/// Retrieve the opener implementation for the target operating system.
///
/// Returns a shared trait object that abstracts away the underlying
/// platform APIs.
pub fn platform_opener() -> Arc<dyn UrlOpener> {
    #[cfg(target_os = "ios")]
    {
        // iOS: type-safe message passing to UIKit via `objc2`.
        Arc::new(ios::IosOpener::new())
    }
    #[cfg(target_os = "android")]
    {
        // Android: intent dispatch through the ART runtime via `jni`.
        Arc::new(android::AndroidOpener::new())
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        // DESKTOP/CI: a stub that reports every open as failed.
        Arc::new(stub::StubOpener)
    }
}
