use std::time::Duration;

use crate::services::common::{Property, TaskHandle, task::cancel_slot};

/// How long a notice stays up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Dismissed automatically
    Transient,
    /// Stays until cleared, used for the unavailable mode
    Persistent,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message text
    pub message: String,
    /// Lifetime
    pub kind: NoticeKind,
    id: u64,
}

/// Owns the single notice slot and its dismiss timer.
#[derive(Debug)]
pub struct NoticeBoard {
    current: Property<Option<Notice>>,
    dismiss: Option<TaskHandle>,
    next_id: u64,
}

impl NoticeBoard {
    /// Board publishing to `current`.
    pub fn new(current: Property<Option<Notice>>) -> Self {
        Self {
            current,
            dismiss: None,
            next_id: 0,
        }
    }

    /// Show `message` for `lifetime`, replacing any notice.
    pub fn transient(&mut self, message: impl Into<String>, lifetime: Duration) {
        let notice = self.publish(message.into(), NoticeKind::Transient);
        let current = self.current.clone();

        self.dismiss = Some(TaskHandle::spawn(async move {
            tokio::time::sleep(lifetime).await;
            current.update(|shown| {
                if shown.as_ref().is_some_and(|n| n.id == notice.id) {
                    *shown = None;
                    true
                } else {
                    false
                }
            });
        }));
    }

    /// Show `message` until cleared.
    pub fn persistent(&mut self, message: impl Into<String>) {
        let message = message.into();
        let already_shown = self
            .current
            .get()
            .is_some_and(|n| n.kind == NoticeKind::Persistent && n.message == message);
        if !already_shown {
            self.publish(message, NoticeKind::Persistent);
        }
    }

    /// Remove the persistent notice, leaving transient ones to expire.
    pub fn clear_persistent(&mut self) {
        self.current.update(|shown| {
            if shown.as_ref().is_some_and(|n| n.kind == NoticeKind::Persistent) {
                *shown = None;
                true
            } else {
                false
            }
        });
    }

    /// Remove any notice and stop the dismiss timer.
    pub fn clear(&mut self) {
        cancel_slot(&mut self.dismiss);
        self.current.set(None);
    }

    fn publish(&mut self, message: String, kind: NoticeKind) -> Notice {
        cancel_slot(&mut self.dismiss);
        self.next_id += 1;
        let notice = Notice {
            message,
            kind,
            id: self.next_id,
        };
        self.current.set(Some(notice.clone()));
        notice
    }
}
