//! Busy flags and the shared error slot.
//!
//! One request per action may be in flight; a second submission of the same action is
//! refused until the first finishes. Different actions never block each other. The
//! error slot is last-write-wins and is the only state actions share.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audit::AuditAction;

#[derive(Debug, Clone, Serialize)]
pub struct LastError {
    pub action: Option<AuditAction>,
    pub code: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ActivityMonitor {
    busy: Mutex<HashSet<AuditAction>>,
    last_error: Mutex<Option<LastError>>,
}

/// Clears the busy flag for its action when dropped, including on early return.
#[derive(Debug)]
pub struct ActionGuard {
    monitor: Arc<ActivityMonitor>,
    action: AuditAction,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.monitor
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.action);
    }
}

impl ActivityMonitor {
    /// Marks `action` busy. `None` if it is already running.
    pub fn try_begin(self: &Arc<Self>, action: AuditAction) -> Option<ActionGuard> {
        let inserted = self
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(action);
        inserted.then(|| ActionGuard {
            monitor: Arc::clone(self),
            action,
        })
    }

    pub fn busy_actions(&self) -> Vec<AuditAction> {
        let busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        AuditAction::ALL
            .into_iter()
            .filter(|a| busy.contains(a))
            .collect()
    }

    pub fn record_error(&self, action: Option<AuditAction>, code: &str, message: &str) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(LastError {
            action,
            code: code.to_string(),
            message: message.to_string(),
            at: Utc::now(),
        });
    }

    pub fn last_error(&self) -> Option<LastError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_action_is_refused_while_busy() {
        let monitor = Arc::new(ActivityMonitor::default());

        let guard = monitor.try_begin(AuditAction::Analyze).unwrap();
        assert!(monitor.try_begin(AuditAction::Analyze).is_none());
        assert_eq!(monitor.busy_actions(), vec![AuditAction::Analyze]);

        drop(guard);
        assert!(monitor.busy_actions().is_empty());
        assert!(monitor.try_begin(AuditAction::Analyze).is_some());
    }

    #[test]
    fn test_independent_actions_run_concurrently() {
        let monitor = Arc::new(ActivityMonitor::default());
        let _audit = monitor.try_begin(AuditAction::Analyze).unwrap();
        let _interview = monitor.try_begin(AuditAction::Interview).unwrap();
        assert_eq!(
            monitor.busy_actions(),
            vec![AuditAction::Analyze, AuditAction::Interview]
        );
    }

    #[test]
    fn test_error_slot_is_last_write_wins() {
        let monitor = ActivityMonitor::default();
        assert!(monitor.last_error().is_none());

        monitor.record_error(Some(AuditAction::Analyze), "AUTH_ERROR", "bad key");
        monitor.record_error(Some(AuditAction::Pivot), "RATE_LIMITED", "slow down");

        let last = monitor.last_error().unwrap();
        assert_eq!(last.action, Some(AuditAction::Pivot));
        assert_eq!(last.code, "RATE_LIMITED");
    }
}
