use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderNumber, Withdrawal};

/// The result of uploading an order number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// The order is new, and was stored with status `NEW`.
    Inserted(Order),
    /// The same user uploaded this order number before. Nothing changed.
    AlreadyLoadedBySameUser(Order),
    /// Another user owns this order number.
    ConflictWithOtherUser(OrderNumber),
}

/// The result of a withdrawal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalResult {
    Recorded(Withdrawal),
    /// The live balance does not cover the requested amount. Nothing was written.
    InsufficientFunds,
    /// A withdrawal against this order number has already been made.
    AlreadyExists(OrderNumber),
}

/// A summary of one reconciliation cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// The number of non-terminal orders at the start of the cycle.
    pub pending: usize,
    /// The number of lookups that were attempted.
    pub queried: usize,
    /// The number of status changes submitted in the batch.
    pub changed: usize,
    /// The number of lookups that failed or returned something unusable.
    pub failed: usize,
    /// The number of rows the batch actually updated.
    pub written: u64,
    pub rate_limited: bool,
    pub timed_out: bool,
}

impl Display for ReconciliationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pending, {} queried, {} changed, {} failed, {} written",
            self.pending, self.queried, self.changed, self.failed, self.written
        )?;
        if self.rate_limited {
            write!(f, " (rate limited)")?;
        }
        if self.timed_out {
            write!(f, " (timed out)")?;
        }
        Ok(())
    }
}

/// A summary of one balance settlement run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettlementResult {
    /// The number of balance snapshots that moved.
    pub snapshots_updated: u64,
}
