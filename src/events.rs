//! Notifications raised while an engine call is in progress
//!
//! A listener is passed into each archive operation and receives the engine's callbacks
//! for the duration of that single call. Every method has a no-op default, and `()` can be
//! used when nothing needs to be observed.

use crate::status::ReplaceDecision;

/// An archive member the engine has just processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNotification {
    name: String,
    size: u64,
}

impl ServiceNotification {
    pub(crate) fn new(name: String, size: u64) -> Self {
        ServiceNotification { name, size }
    }

    /// Member name as reported by the engine
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size reported alongside the name
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Receives notifications from archive creation and modification
pub trait WriteListener {
    /// Progress text from the engine
    fn on_print(&mut self, message: &str) {
        let _ = message;
    }

    /// A member was added, updated, moved or deleted
    fn on_service(&mut self, notification: &ServiceNotification) {
        let _ = notification;
    }
}

/// Receives notifications from extraction
pub trait ExtractListener {
    /// Progress text from the engine
    fn on_print(&mut self, message: &str) {
        let _ = message;
    }

    /// A member was extracted
    fn on_service(&mut self, notification: &ServiceNotification) {
        let _ = notification;
    }

    /// Informational output, such as archive listings
    fn on_application_message(&mut self, notification: &ServiceNotification) {
        let _ = notification;
    }

    /// A file being extracted already exists
    ///
    /// `decision` starts as [`ReplaceDecision::OverwriteOnce`]; leave it alone to accept
    /// that default.
    fn on_file_replace(&mut self, prompt: &str, decision: &mut ReplaceDecision) {
        let _ = (prompt, decision);
    }

    /// The engine asks for an audible alert
    ///
    /// Return `true` if the alert was handled. When `false` is returned the reader falls
    /// back to the system bell if it was configured with `use_system_sound(true)`.
    fn on_sound(&mut self) -> bool {
        false
    }
}

impl WriteListener for () {}

impl ExtractListener for () {}
