use super::{Context, unexpected};
use crate::error::{FinicityError, Resource};
use crate::models::{
    Account, AccountLoginForm, Accounts, ChallengeSet, LoginForm, MfaChallenge, OperationResult,
};
use crate::transport::{MFA_SESSION_HEADER, Request};
use crate::xml::{from_xml, to_xml};
use log::{debug, info};
use reqwest::StatusCode;

/// Account discovery, activation and maintenance.
///
/// The add-all, discover and refresh calls may stop at an MFA challenge;
/// they return an [`OperationResult`] and have an `_mfa` follow-up that
/// submits the answers under the challenge's session.
#[derive(Debug, Clone)]
pub struct AccountOperations {
    context: Context,
}

impl AccountOperations {
    pub(crate) fn new(context: Context) -> Self {
        Self { context }
    }

    /// Submit institution credentials and add every account found there.
    pub async fn add_all_accounts(
        &self,
        customer_id: &str,
        institution_id: &str,
        login_form: &AccountLoginForm,
    ) -> Result<OperationResult<Account>, FinicityError> {
        info!("Adding all accounts of customer {customer_id} at institution {institution_id}");
        let request = Request::post(&[
            "v1",
            "customers",
            customer_id,
            "institutions",
            institution_id,
            "accounts",
            "addall",
        ])
        .body(to_xml(login_form)?);
        self.challengeable(request).await
    }

    /// Answer the challenge raised by [`add_all_accounts`](Self::add_all_accounts).
    pub async fn add_all_accounts_mfa(
        &self,
        session: &str,
        customer_id: &str,
        institution_id: &str,
        challenges: &ChallengeSet,
    ) -> Result<OperationResult<Account>, FinicityError> {
        let request = Request::post(&[
            "v1",
            "customers",
            customer_id,
            "institutions",
            institution_id,
            "accounts",
            "addall",
            "mfa",
        ])
        .header(MFA_SESSION_HEADER, session)
        .body(to_xml(&challenges.to_request()?)?);
        self.challengeable(request).await
    }

    /// List the accounts available at an institution without adding them.
    pub async fn discover_accounts(
        &self,
        customer_id: &str,
        institution_id: &str,
        login_form: &AccountLoginForm,
    ) -> Result<OperationResult<Account>, FinicityError> {
        info!("Discovering accounts of customer {customer_id} at institution {institution_id}");
        let request = Request::post(&[
            "v1",
            "customers",
            customer_id,
            "institutions",
            institution_id,
            "accounts",
        ])
        .body(to_xml(login_form)?);
        self.challengeable(request).await
    }

    /// Answer the challenge raised by [`discover_accounts`](Self::discover_accounts).
    pub async fn discover_accounts_mfa(
        &self,
        session: &str,
        customer_id: &str,
        institution_id: &str,
        challenges: &ChallengeSet,
    ) -> Result<OperationResult<Account>, FinicityError> {
        let request = Request::post(&[
            "v1",
            "customers",
            customer_id,
            "institutions",
            institution_id,
            "accounts",
            "mfa",
        ])
        .header(MFA_SESSION_HEADER, session)
        .body(to_xml(&challenges.to_request()?)?);
        self.challengeable(request).await
    }

    /// Activate discovered accounts so they are aggregated.
    pub async fn activate_accounts(
        &self,
        customer_id: &str,
        institution_id: &str,
        accounts: &[Account],
    ) -> Result<Vec<Account>, FinicityError> {
        if accounts.is_empty() {
            return Err(FinicityError::InvalidParameter(
                "at least one account must be activated",
            ));
        }
        info!(
            "Activating {} account(s) of customer {customer_id}",
            accounts.len()
        );
        let body = to_xml(&Accounts {
            accounts: accounts.to_vec(),
        })?;
        let request = Request::put(&[
            "v2",
            "customers",
            customer_id,
            "institutions",
            institution_id,
            "accounts",
        ])
        .body(body);
        let activated: Accounts = self
            .context
            .fetch(Resource::Account, request, StatusCode::OK)
            .await?;
        Ok(activated.accounts)
    }

    /// Pull fresh data for one account from its institution.
    pub async fn refresh_account(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Result<OperationResult<Account>, FinicityError> {
        debug!("Refreshing account {account_id} of customer {customer_id}");
        let request = Request::post(&["v1", "customers", customer_id, "accounts", account_id]);
        self.challengeable(request).await
    }

    /// Answer the challenge raised by [`refresh_account`](Self::refresh_account).
    pub async fn refresh_account_mfa(
        &self,
        session: &str,
        customer_id: &str,
        account_id: &str,
        challenge: &MfaChallenge,
    ) -> Result<OperationResult<Account>, FinicityError> {
        if !challenge.questions.iter().all(|q| q.is_answered()) {
            return Err(FinicityError::InvalidParameter(
                "every MFA question needs an answer before resubmitting",
            ));
        }
        let request = Request::post(&["v1", "customers", customer_id, "accounts", account_id])
            .header(MFA_SESSION_HEADER, session)
            .body(to_xml(challenge)?);
        self.challengeable(request).await
    }

    /// Refresh every account of a customer.
    pub async fn refresh_accounts(&self, customer_id: &str) -> Result<Vec<Account>, FinicityError> {
        debug!("Refreshing all accounts of customer {customer_id}");
        let request = Request::post(&["v1", "customers", customer_id, "accounts"]);
        let accounts: Accounts = self
            .context
            .fetch(Resource::Account, request, StatusCode::OK)
            .await?;
        Ok(accounts.accounts)
    }

    pub async fn get_accounts(&self, customer_id: &str) -> Result<Vec<Account>, FinicityError> {
        let request = Request::get(&["v1", "customers", customer_id, "accounts"]);
        let accounts: Accounts = self
            .context
            .fetch(Resource::Account, request, StatusCode::OK)
            .await?;
        Ok(accounts.accounts)
    }

    pub async fn get_institution_accounts(
        &self,
        customer_id: &str,
        institution_id: &str,
    ) -> Result<Vec<Account>, FinicityError> {
        let request = Request::get(&[
            "v1",
            "customers",
            customer_id,
            "institutions",
            institution_id,
            "accounts",
        ]);
        let accounts: Accounts = self
            .context
            .fetch(Resource::Account, request, StatusCode::OK)
            .await?;
        Ok(accounts.accounts)
    }

    pub async fn get_account(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Result<Account, FinicityError> {
        let request = Request::get(&["v1", "customers", customer_id, "accounts", account_id]);
        self.context
            .fetch(Resource::Account, request, StatusCode::OK)
            .await
    }

    pub async fn modify_account(
        &self,
        customer_id: &str,
        account_id: &str,
        account: &Account,
    ) -> Result<(), FinicityError> {
        info!("Modifying account {account_id} of customer {customer_id}");
        let request = Request::put(&["v1", "customers", customer_id, "accounts", account_id])
            .body(to_xml(account)?);
        self.context.execute(Resource::Account, request).await
    }

    pub async fn delete_account(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Result<(), FinicityError> {
        info!("Deleting account {account_id} of customer {customer_id}");
        let request = Request::delete(&["v1", "customers", customer_id, "accounts", account_id]);
        self.context.execute(Resource::Account, request).await
    }

    /// The login form of the institution behind an account.
    pub async fn get_account_login_form(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Result<LoginForm, FinicityError> {
        let request = Request::get(&[
            "v1",
            "customers",
            customer_id,
            "accounts",
            account_id,
            "loginForm",
        ]);
        self.context
            .fetch(Resource::Account, request, StatusCode::OK)
            .await
    }

    /// Replace the institution credentials stored for an account.
    pub async fn modify_account_credentials(
        &self,
        customer_id: &str,
        account_id: &str,
        login_form: &LoginForm,
    ) -> Result<(), FinicityError> {
        info!("Updating credentials of account {account_id}");
        let request = Request::put(&[
            "v1",
            "customers",
            customer_id,
            "accounts",
            account_id,
            "loginForm",
        ])
        .body(to_xml(login_form)?);
        self.context.execute(Resource::Account, request).await
    }

    // 200 carries accounts, 203 carries challenges plus the session header.
    async fn challengeable(
        &self,
        request: Request,
    ) -> Result<OperationResult<Account>, FinicityError> {
        let response = self.context.send(request).await?;
        match response.status {
            StatusCode::OK => {
                let accounts: Accounts = from_xml(&response.body)?;
                Ok(OperationResult::Resources(accounts.accounts))
            }
            StatusCode::NON_AUTHORITATIVE_INFORMATION => {
                let session = response
                    .header(MFA_SESSION_HEADER)
                    .ok_or(FinicityError::MissingHeader(MFA_SESSION_HEADER))?;
                let challenges = ChallengeSet::parse(&response.body, session)?;
                info!("Institution requires MFA answers");
                Ok(OperationResult::Challenge(challenges))
            }
            _ => Err(unexpected(Resource::Account, response)),
        }
    }
}
