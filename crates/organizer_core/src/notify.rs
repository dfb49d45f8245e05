//! Outcome notifications for UI toasts.
//!
//! # Responsibility
//! - Define the notification collaborator the organizer reports outcomes to.
//!
//! # Invariants
//! - Notifications are informational only and never gate organizer logic.
//! - Messages carry bucket labels and counts, never task titles.

use log::{error, info, warn};
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Severity of one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives user-facing outcome messages.
pub trait Notifier {
    fn notify(&self, message: &str, severity: Severity);
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn notify(&self, message: &str, severity: Severity) {
        (**self).notify(message, severity);
    }
}

/// Forwards notifications to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => {
                info!("event=notify module=notify severity={severity} message={message}")
            }
            Severity::Warning => {
                warn!("event=notify module=notify severity={severity} message={message}")
            }
            Severity::Error => {
                error!("event=notify module=notify severity={severity} message={message}")
            }
        }
    }
}

/// Queues notifications in memory until the UI drains them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: RefCell<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every queued notification, oldest first.
    pub fn drain(&self) -> Vec<(String, Severity)> {
        self.entries.borrow_mut().drain(..).collect()
    }

    /// Severity of the most recent notification.
    pub fn last_severity(&self) -> Option<Severity> {
        self.entries.borrow().last().map(|(_, severity)| *severity)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.entries
            .borrow_mut()
            .push((message.to_string(), severity));
    }
}
