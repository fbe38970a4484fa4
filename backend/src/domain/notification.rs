//! Outbound ledger events.
//!
//! Delivery (push, SMS, in-app) belongs to an external collaborator. The
//! workflow emits events fire-and-forget; a failing or slow sink must never
//! affect a decision that has already been committed.

use log::info;

use crate::domain::models::transaction::TransactionKind;

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    Approved {
        recipient_id: String,
        account_id: String,
        transaction_id: String,
        kind: TransactionKind,
        nominal: i64,
        balance: i64,
    },
    Rejected {
        recipient_id: String,
        account_id: String,
        transaction_id: String,
        reason: String,
    },
    GoalReached {
        recipient_id: String,
        account_id: String,
        balance: i64,
        target: i64,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Approved { .. } => "approved",
            LedgerEvent::Rejected { .. } => "rejected",
            LedgerEvent::GoalReached { .. } => "goal_reached",
        }
    }

    /// User the event is addressed to
    pub fn recipient_id(&self) -> &str {
        match self {
            LedgerEvent::Approved { recipient_id, .. }
            | LedgerEvent::Rejected { recipient_id, .. }
            | LedgerEvent::GoalReached { recipient_id, .. } => recipient_id,
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: LedgerEvent);
}

/// Sink that records every event in the application log
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, event: LedgerEvent) {
        info!(
            "Notification [{}] for {}: {:?}",
            event.name(),
            event.recipient_id(),
            event
        );
    }
}
