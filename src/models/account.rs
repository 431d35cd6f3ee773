use super::deserialize_decimal_opt;
use super::institution::LoginForm;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
    Checking,
    Savings,
    Cd,
    MoneyMarket,
    CreditCard,
    LineOfCredit,
    Investment,
    InvestmentTaxDeferred,
    EmployeeStockPurchasePlan,
    Ira,
    #[serde(rename = "401k")]
    Retirement401k,
    Roth,
    #[serde(rename = "403b")]
    Retirement403b,
    #[serde(rename = "529")]
    Savings529,
    Rollover,
    Ugma,
    Utma,
    Keogh,
    #[serde(rename = "457")]
    Retirement457,
    #[serde(rename = "401a")]
    Retirement401a,
    Mortgage,
    Loan,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountStatus {
    Pending,
    Active,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "account", rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub status: AccountStatus,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_status_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub balance_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub aggregation_success_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub aggregation_attempt_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "accounts")]
pub struct Accounts {
    #[serde(rename = "account", default)]
    pub accounts: Vec<Account>,
}

/// Institution credentials submitted when adding or discovering accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "accounts")]
pub struct AccountLoginForm {
    pub credentials: LoginForm,
}

impl From<LoginForm> for AccountLoginForm {
    fn from(credentials: LoginForm) -> Self {
        Self { credentials }
    }
}
