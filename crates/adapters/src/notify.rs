// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notifications for blocked projects.

/// Sink for operator-facing notifications.
pub trait Notifier: Clone + Send + Sync + 'static {
    fn notify(&self, summary: &str, body: &str);
}

/// Desktop notifier backed by the platform notification service.
#[derive(Clone, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) {
        let result = notify_rust::Notification::new()
            .summary(summary)
            .body(body)
            .appname("foreman")
            .show();
        if let Err(e) = result {
            // Notification failure is never fatal
            tracing::debug!(error = %e, "desktop notification failed");
        }
    }
}

/// Notifier that drops everything (headless daemons, tests).
#[derive(Clone, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _summary: &str, _body: &str) {}
}
