// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android opener via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. App-switching dispatches an `ACTION_VIEW`
// intent; the browser surface is the same intent resolved by the user's
// browser (or a Custom-Tabs-capable one when installed). Feasibility goes
// through `PackageManager.resolveActivity`.
//
// The return leg is wired by the host Activity: its `onNewIntent` /
// `onResume` overrides must forward the callback URL (or its absence) to
// the bridge controller's resume entry points.

#![cfg(target_os = "android")]

use jni::objects::{JObject, JString, JValue};
use jni::JNIEnv;
use url::Url;

use schleuse_core::error::{Result, SchleuseError};

use crate::opener::{OpenCompletion, PresentationHost, UrlOpener};

/// Obtain a [`JNIEnv`] handle from the global Android context.
///
/// Retrieves the `JavaVM*` pointer set by `android_main` or
/// `ANativeActivity_onCreate`, then attaches the current thread if it is
/// not already attached.
fn jni_env() -> Result<JNIEnv<'static>> {
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { jni::JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| SchleuseError::Opener(format!("failed to obtain JavaVM: {e}")))?;
    vm.attach_current_thread()
        .map_err(|e| SchleuseError::Opener(format!("failed to attach JNI thread: {e}")))
}

/// Obtain the current Android `Activity` as a [`JObject`].
fn activity() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(SchleuseError::Opener(
            "Android context is null; native activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Convenience: map any `jni::errors::Error` into `SchleuseError::Opener`.
fn jni_err(context: &str, e: jni::errors::Error) -> SchleuseError {
    SchleuseError::Opener(format!("{context}: {e}"))
}

/// Build an `ACTION_VIEW` intent for `url`.
fn view_intent<'e>(env: &mut JNIEnv<'e>, url: &Url) -> Result<JObject<'e>> {
    let j_url: JString = env
        .new_string(url.as_str())
        .map_err(|e| jni_err("new_string(url)", e))?;

    // Uri.parse(url)
    let uri: JObject = env
        .call_static_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[JValue::Object(&j_url)],
        )
        .map_err(|e| jni_err("Uri.parse", e))?
        .l()
        .map_err(|e| jni_err("Uri.parse->l", e))?;

    let j_action: JString = env
        .new_string("android.intent.action.VIEW")
        .map_err(|e| jni_err("new_string(action)", e))?;

    // new Intent(ACTION_VIEW, uri)
    env.new_object(
        "android/content/Intent",
        "(Ljava/lang/String;Landroid/net/Uri;)V",
        &[JValue::Object(&j_action), JValue::Object(&uri)],
    )
    .map_err(|e| jni_err("new Intent", e))
}

/// Android implementation of the opener.
///
/// Zero-sized; all state lives on the Java side.
pub struct AndroidOpener;

impl AndroidOpener {
    /// Create a new Android opener. Does not touch JNI; the first JNI call
    /// happens lazily when a trait method is invoked.
    pub fn new() -> Self {
        Self
    }

    fn dispatch(&self, url: &Url) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let intent = view_intent(&mut env, url)?;

        env.call_method(
            &activity,
            "startActivity",
            "(Landroid/content/Intent;)V",
            &[JValue::Object(&intent)],
        )
        .map_err(|e| jni_err("startActivity", e))?;

        // ActivityNotFoundException surfaces as a pending Java exception.
        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_clear();
            return Err(SchleuseError::Opener(
                "no activity resolves the outbound URL".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AndroidOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlOpener for AndroidOpener {
    /// Whether any installed activity resolves an `ACTION_VIEW` intent for
    /// `url`'s scheme.
    ///
    /// On Android 11+ this additionally requires a matching `<queries>`
    /// declaration in the host manifest, or the resolver answers null.
    fn can_open(&self, url: &Url) -> bool {
        let feasible = || -> Result<bool> {
            let mut env = jni_env()?;
            let activity = activity()?;
            let intent = view_intent(&mut env, url)?;

            let pm: JObject = env
                .call_method(
                    &activity,
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )
                .map_err(|e| jni_err("getPackageManager", e))?
                .l()
                .map_err(|e| jni_err("getPackageManager->l", e))?;

            let resolved: JObject = env
                .call_method(
                    &pm,
                    "resolveActivity",
                    "(Landroid/content/Intent;I)Landroid/content/pm/ResolveInfo;",
                    &[JValue::Object(&intent), JValue::Int(0)],
                )
                .map_err(|e| jni_err("resolveActivity", e))?
                .l()
                .map_err(|e| jni_err("resolveActivity->l", e))?;

            Ok(!resolved.is_null())
        };

        match feasible() {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Android: feasibility check failed: {e}");
                false
            }
        }
    }

    fn open_url(&self, url: &Url, completion: OpenCompletion) {
        tracing::info!(%url, "Android: dispatching ACTION_VIEW intent");
        match self.dispatch(url) {
            Ok(()) => completion(true, None),
            Err(e) => completion(false, Some(e)),
        }
    }

    fn open_in_browser_surface(
        &self,
        url: &Url,
        _from: Option<&dyn PresentationHost>,
        completion: OpenCompletion,
    ) {
        // The same intent, resolved by the default browser. Hosts that ship
        // androidx can upgrade this to a Custom Tabs launch in their glue
        // code without touching the bridge.
        tracing::info!(%url, "Android: opening browser surface");
        match self.dispatch(url) {
            Ok(()) => completion(true, None),
            Err(e) => completion(false, Some(e)),
        }
    }
}
