//! Wire types exchanged with the aggregation API.

mod account;
mod customer;
mod institution;
mod mfa;
pub(crate) mod partner;
mod transaction;
mod txpush;

use rust_decimal::Decimal;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

pub use account::{Account, AccountLoginForm, AccountStatus, AccountType, Accounts};
pub use customer::{Customer, CustomerType};
pub use institution::{Address, Institution, InstitutionDetails, LoginField, LoginForm};
pub use mfa::{ChallengeSet, Choice, MfaChallenge, MfaQuestion};
pub use transaction::{Categorization, Subaccount, Transaction, TransactionStatus};
pub use txpush::{Subscription, SubscriptionType};

pub(crate) use customer::Customers;
pub(crate) use institution::Institutions;
pub(crate) use transaction::Transactions;
pub(crate) use txpush::Subscriptions;

/// Outcome of an operation that may stop at an MFA challenge.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult<T> {
    /// The call completed (HTTP 200).
    Resources(Vec<T>),
    /// The institution wants answers first (HTTP 203).
    Challenge(ChallengeSet),
}

impl<T> OperationResult<T> {
    pub fn is_challenge(&self) -> bool {
        matches!(self, OperationResult::Challenge(_))
    }

    pub fn resources(self) -> Option<Vec<T>> {
        match self {
            OperationResult::Resources(items) => Some(items),
            OperationResult::Challenge(_) => None,
        }
    }

    pub fn challenge(self) -> Option<ChallengeSet> {
        match self {
            OperationResult::Resources(_) => None,
            OperationResult::Challenge(set) => Some(set),
        }
    }
}

// Amounts arrive as element text; parse them from the string form.
fn deserialize_decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map(Some)
            .map_err(|_| D::Error::custom("invalid decimal value")),
    }
}
