use std::{fmt::Display, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderNumber, OrderStatusType, Points};

#[derive(Debug, Clone, Error)]
pub enum AccrualError {
    #[error("Could not reach the accrual service. {0}")]
    Transport(String),
    #[error("Could not decode the accrual service response. {0}")]
    Decode(String),
}

/// Order status as reported by the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    Registered,
    Invalid,
    Processing,
    Processed,
}

impl AccrualStatus {
    /// The accrual service's `REGISTERED` means it knows about the order but has not started on it, which is our `NEW`.
    pub fn to_order_status(self) -> OrderStatusType {
        match self {
            AccrualStatus::Registered => OrderStatusType::New,
            AccrualStatus::Invalid => OrderStatusType::Invalid,
            AccrualStatus::Processing => OrderStatusType::Processing,
            AccrualStatus::Processed => OrderStatusType::Processed,
        }
    }
}

/// A successful response from the accrual service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualReport {
    pub order: OrderNumber,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

/// Everything a single lookup can tell us, apart from transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(AccrualReport),
    /// The service asked us to back off. No further lookups should be made this cycle.
    RateLimited { retry_after: Option<Duration> },
    /// The service does not know about this order (yet).
    NotRegistered,
    /// Any other response. Treated as transient.
    Unexpected { code: u16, message: String },
}

impl Display for LookupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupOutcome::Found(report) => write!(f, "{} is {:?}", report.order, report.status),
            LookupOutcome::RateLimited { retry_after: Some(d) } => write!(f, "rate limited for {}s", d.as_secs()),
            LookupOutcome::RateLimited { retry_after: None } => write!(f, "rate limited"),
            LookupOutcome::NotRegistered => write!(f, "not registered"),
            LookupOutcome::Unexpected { code, message } => write!(f, "unexpected response {code}: {message}"),
        }
    }
}

/// The client side of the external accrual service.
///
/// Implementations make exactly one request per call and never retry internally. Retrying is the caller's business.
#[allow(async_fn_in_trait)]
pub trait AccrualLookup {
    async fn lookup(&self, number: &OrderNumber) -> Result<LookupOutcome, AccrualError>;
}
