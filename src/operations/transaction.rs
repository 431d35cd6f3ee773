use super::Context;
use crate::error::{FinicityError, Resource};
use crate::models::{Transaction, Transactions};
use crate::transport::Request;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::StatusCode;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    Asc,
    Desc,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = match self {
            Sort::Asc => "asc",
            Sort::Desc => "desc",
        };
        f.write_str(v)
    }
}

/// Date window and paging for transaction listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub start: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<Sort>,
    pub include_pending: Option<bool>,
}

impl TransactionQuery {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            start: None,
            limit: None,
            sort: None,
            include_pending: None,
        }
    }

    pub fn page(mut self, start: u32, limit: u32) -> Self {
        self.start = Some(start);
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn include_pending(mut self, include: bool) -> Self {
        self.include_pending = Some(include);
        self
    }

    fn apply(&self, request: Request) -> Result<Request, FinicityError> {
        if self.from > self.to {
            return Err(FinicityError::InvalidDateRange {
                start: self.from,
                end: self.to,
            });
        }
        Ok(request
            .query("fromDate", self.from.timestamp())
            .query("toDate", self.to.timestamp())
            .query_opt("start", self.start)
            .query_opt("limit", self.limit)
            .query_opt("sort", self.sort)
            .query_opt("includePending", self.include_pending))
    }
}

#[derive(Debug, Clone)]
pub struct TransactionOperations {
    context: Context,
}

impl TransactionOperations {
    pub(crate) fn new(context: Context) -> Self {
        Self { context }
    }

    /// Transactions across all accounts of a customer.
    pub async fn get_transactions(
        &self,
        customer_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, FinicityError> {
        debug!(
            "Fetching transactions of customer {customer_id} from {} to {}",
            query.from, query.to
        );
        let request = query.apply(Request::get(&["v2", "customers", customer_id, "transactions"]))?;
        self.list(request).await
    }

    pub async fn get_account_transactions(
        &self,
        customer_id: &str,
        account_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, FinicityError> {
        debug!(
            "Fetching transactions of account {account_id} from {} to {}",
            query.from, query.to
        );
        let request = query.apply(Request::get(&[
            "v2",
            "customers",
            customer_id,
            "accounts",
            account_id,
            "transactions",
        ]))?;
        self.list(request).await
    }

    pub async fn get_transaction(
        &self,
        customer_id: &str,
        transaction_id: &str,
    ) -> Result<Transaction, FinicityError> {
        let request = Request::get(&["v2", "customers", customer_id, "transactions", transaction_id]);
        self.context
            .fetch(Resource::Transaction, request, StatusCode::OK)
            .await
    }

    async fn list(&self, request: Request) -> Result<Vec<Transaction>, FinicityError> {
        let transactions: Transactions = self
            .context
            .fetch(Resource::Transaction, request, StatusCode::OK)
            .await?;
        debug!("Fetched {} transaction(s)", transactions.transactions.len());
        Ok(transactions.transactions)
    }
}
