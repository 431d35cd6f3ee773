use super::Context;
use crate::error::{FinicityError, Resource};
use crate::models::{Subscription, Subscriptions, Transaction};
use crate::transport::Request;
use crate::xml::to_xml;
use log::info;
use reqwest::StatusCode;

/// TxPush subscriptions: account and transaction events posted to a
/// caller-owned listener URL.
#[derive(Debug, Clone)]
pub struct TxPushOperations {
    context: Context,
}

impl TxPushOperations {
    pub(crate) fn new(context: Context) -> Self {
        Self { context }
    }

    /// Subscribe a listener; the API answers with one subscription per event kind.
    pub async fn enable_tx_push_notifications(
        &self,
        customer_id: &str,
        account_id: &str,
        subscription: &Subscription,
    ) -> Result<Vec<Subscription>, FinicityError> {
        if subscription.callback_url.as_deref().is_none_or(str::is_empty) {
            return Err(FinicityError::InvalidParameter("callback_url is required"));
        }
        info!("Enabling TxPush for account {account_id} of customer {customer_id}");
        let request = Request::post(&["v1", "customers", customer_id, "accounts", account_id, "txpush"])
            .body(to_xml(subscription)?);
        let subscriptions: Subscriptions = self
            .context
            .fetch(Resource::TxPush, request, StatusCode::CREATED)
            .await?;
        Ok(subscriptions.subscriptions)
    }

    pub async fn disable_tx_push_notifications(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Result<(), FinicityError> {
        info!("Disabling TxPush for account {account_id} of customer {customer_id}");
        let request =
            Request::delete(&["v1", "customers", customer_id, "accounts", account_id, "txpush"]);
        self.context.execute(Resource::TxPush, request).await
    }

    pub async fn delete_tx_push_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<(), FinicityError> {
        info!("Deleting TxPush subscription {subscription_id}");
        let request = Request::delete(&["v1", "customers", customer_id, "subscriptions", subscription_id]);
        self.context.execute(Resource::TxPush, request).await
    }

    /// Inject a transaction into a testing account, which fires a TxPush event.
    pub async fn add_transaction_for_testing_account(
        &self,
        customer_id: &str,
        account_id: &str,
        transaction: &Transaction,
    ) -> Result<Transaction, FinicityError> {
        let request = Request::post(&[
            "v1",
            "customers",
            customer_id,
            "accounts",
            account_id,
            "transactions",
        ])
        .body(to_xml(transaction)?);
        self.context
            .fetch(Resource::TxPush, request, StatusCode::CREATED)
            .await
    }
}
