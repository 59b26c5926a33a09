// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User notification interface.

/// Fire-and-forget user-visible alerts for non-fatal conditions
/// (duplicate titles, aborted saves).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}
