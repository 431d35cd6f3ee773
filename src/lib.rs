//! Async client for the Finicity aggregation REST API.
//!
//! A [`Client`] authenticates once with the partner credentials and shares
//! the resulting token between all resource operations, renewing it when it
//! goes stale. Calls that link institution accounts may answer with an MFA
//! challenge instead of accounts; see [`OperationResult`].

pub mod client;
pub mod error;
pub mod models;
pub mod operations;
pub mod token;
pub mod transport;
pub mod xml;

pub use client::{Client, ClientBuilder};
pub use error::{AuthenticationError, FinicityError, ParseError, Resource, TransportError};
pub use models::{
    Account, AccountLoginForm, ChallengeSet, Customer, Institution, LoginForm, MfaChallenge,
    MfaQuestion, OperationResult, Subscription, Transaction,
};
pub use operations::{CustomerQuery, InstitutionQuery, Sort, TransactionQuery};
pub use token::{Credentials, Token};
