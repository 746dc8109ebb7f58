use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use lpg_common::Points;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::is_valid_order_number;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// The external-facing identifier of a purchase order. Order numbers are decimal strings with a Luhn check digit, and
/// are globally unique across users.
///
/// `OrderNumber` does not validate on construction, since numbers read back from the database are valid by
/// definition. Use [`OrderNumber::parse`] for untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    /// Trims the input and accepts it only if it is a Luhn-valid sequence of decimal digits.
    pub fn parse<S: AsRef<str>>(s: S) -> Result<Self, ConversionError> {
        let s = s.as_ref();
        if is_valid_order_number(s) {
            Ok(Self(s.trim().to_string()))
        } else {
            Err(ConversionError(format!("'{s}' is not a valid order number")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been uploaded, but the accrual service has not started on it yet.
    New,
    /// The accrual service is calculating the reward for the order.
    Processing,
    /// The accrual service rejected the order. No points will be awarded. Terminal.
    Invalid,
    /// The reward has been calculated and the accrual is final. Terminal.
    Processed,
}

impl OrderStatusType {
    /// Terminal orders are never polled again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to New");
            OrderStatusType::New
        })
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[sqlx(rename = "pwdhash")]
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S, password_hash: S) -> Self {
        Self { username: username.into(), password_hash: password_hash.into() }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub number: OrderNumber,
    /// The id of the user that uploaded the order
    pub customer: String,
    pub status: OrderStatusType,
    #[sqlx(rename = "income")]
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
    /// Store-assigned time of the last change to this row, in milliseconds since the Unix epoch
    pub ts: i64,
}

//--------------------------------------      Withdrawal     ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Withdrawal {
    pub number: OrderNumber,
    pub customer: String,
    #[sqlx(rename = "withdraw")]
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
    pub ts: i64,
}

//--------------------------------------    BalanceSnapshot   --------------------------------------------------------
/// The folded balance for a user. Every order accrual and withdrawal with `ts <= watermark` is included in `balance`
/// and `total_withdraw`. Anything newer has not been folded yet.
#[derive(Debug, Clone, Copy, FromRow, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub balance: Points,
    pub total_withdraw: Points,
    #[sqlx(rename = "ts")]
    pub watermark: i64,
}

//--------------------------------------     UserBalance      ---------------------------------------------------------
/// The live balance for a user: the snapshot plus any unfolded deltas.
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserBalance {
    pub current: Points,
    pub withdrawn: Points,
}

//--------------------------------------     StatusUpdate     ---------------------------------------------------------
/// A change in order status reported by the accrual service, to be written in a reconciliation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub number: OrderNumber,
    pub status: OrderStatusType,
    pub accrual: Points,
}

impl StatusUpdate {
    pub fn new(number: OrderNumber, status: OrderStatusType, accrual: Points) -> Self {
        Self { number, status, accrual }
    }
}

//--------------------------------------    NewWithdrawal     ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub customer: String,
    pub number: OrderNumber,
    pub amount: Points,
}

impl NewWithdrawal {
    pub fn new<S: Into<String>>(customer: S, number: OrderNumber, amount: Points) -> Self {
        Self { customer: customer.into(), number, amount }
    }
}
