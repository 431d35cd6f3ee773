use super::deserialize_decimal_opt;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    Active,
    Pending,
    Shadow,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subaccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Categorization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_payee_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "transaction", rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub bonus_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub escrow_amount: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub fee_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_transaction_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub interest_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub posted_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub principal_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subaccount: Option<Subaccount>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_quantity: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorization: Option<Categorization>,
}

impl Transaction {
    /// A synthetic transaction for a testing account.
    pub fn new(
        amount: Decimal,
        description: impl Into<String>,
        posted_date: DateTime<Utc>,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        Self {
            amount: Some(amount),
            description: Some(description.into()),
            posted_date: Some(posted_date),
            transaction_date: Some(transaction_date),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct Transactions {
    #[serde(rename = "transaction", default)]
    pub(crate) transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{from_xml, to_xml};
    use std::str::FromStr;

    #[test]
    fn parses_transactions() {
        let parsed: Transactions = from_xml(
            r#"<transactions found="1" displaying="1" moreAvailable="false">
               <transaction>
                  <accountId>2055</accountId>
                  <amount>-124.99</amount>
                  <bonusAmount>0.0</bonusAmount>
                  <createdDate>1422272248</createdDate>
                  <customerId>41442</customerId>
                  <description>CLICKDESK CA</description>
                  <id>84293</id>
                  <institutionTransactionId>0000237637</institutionTransactionId>
                  <postedDate>1422082800</postedDate>
                  <status>active</status>
                  <subaccount>
                     <name>J Green</name>
                     <number>XXXX-XXXXXX-23687</number>
                  </subaccount>
                  <transactionDate>1422082800</transactionDate>
                  <categorization>
                     <normalizedPayeeName>CLICKDESK CA</normalizedPayeeName>
                     <category>Unknown</category>
                  </categorization>
               </transaction>
            </transactions>"#,
        )
        .unwrap();
        assert_eq!(parsed.transactions.len(), 1);
        let txn = &parsed.transactions[0];
        assert_eq!(txn.id.as_deref(), Some("84293"));
        assert_eq!(txn.amount, Some(Decimal::from_str("-124.99").unwrap()));
        assert_eq!(txn.bonus_amount, Some(Decimal::ZERO));
        assert_eq!(txn.status, Some(TransactionStatus::Active));
        assert_eq!(txn.posted_date, DateTime::from_timestamp(1422082800, 0));
        assert_eq!(
            txn.subaccount.as_ref().and_then(|s| s.name.as_deref()),
            Some("J Green")
        );
        assert_eq!(
            txn.categorization.as_ref().and_then(|c| c.category.as_deref()),
            Some("Unknown")
        );
    }

    #[test]
    fn testing_transaction_body() {
        let at = DateTime::from_timestamp(1422082800, 0).unwrap();
        let xml = to_xml(&Transaction::new(Decimal::new(2400, 2), "description", at, at)).unwrap();
        assert!(xml.starts_with("<transaction><amount>24.00</amount>"));
        assert!(xml.contains("<postedDate>1422082800</postedDate>"));
        assert!(xml.contains("<transactionDate>1422082800</transactionDate>"));
        assert!(!xml.contains("<id>"));
    }
}
