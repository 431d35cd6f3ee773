use super::{Context, non_blank};
use crate::error::{FinicityError, Resource};
use crate::models::{Institution, InstitutionDetails, Institutions, LoginForm};
use crate::transport::Request;
use reqwest::StatusCode;

/// Filters for [`InstitutionOperations::get_institutions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstitutionQuery {
    pub search: Option<String>,
    pub start: Option<u32>,
    pub limit: Option<u32>,
}

impl InstitutionQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Read-only institution metadata.
#[derive(Debug, Clone)]
pub struct InstitutionOperations {
    context: Context,
}

impl InstitutionOperations {
    pub(crate) fn new(context: Context) -> Self {
        Self { context }
    }

    pub async fn get_institutions(
        &self,
        query: &InstitutionQuery,
    ) -> Result<Vec<Institution>, FinicityError> {
        let request = Request::get(&["v1", "institutions"])
            .query_opt("search", non_blank(query.search.as_deref()))
            .query_opt("start", query.start)
            .query_opt("limit", query.limit);
        let institutions: Institutions = self
            .context
            .fetch(Resource::Institution, request, StatusCode::OK)
            .await?;
        Ok(institutions.institutions)
    }

    pub async fn get_institution(&self, institution_id: &str) -> Result<Institution, FinicityError> {
        let request = Request::get(&["v1", "institutions", institution_id]);
        self.context
            .fetch(Resource::Institution, request, StatusCode::OK)
            .await
    }

    /// Institution record together with its login form.
    pub async fn get_institution_details(
        &self,
        institution_id: &str,
    ) -> Result<InstitutionDetails, FinicityError> {
        let request = Request::get(&["v1", "institutions", institution_id, "details"]);
        self.context
            .fetch(Resource::Institution, request, StatusCode::OK)
            .await
    }

    pub async fn get_institution_login_form(
        &self,
        institution_id: &str,
    ) -> Result<LoginForm, FinicityError> {
        let request = Request::get(&["v1", "institutions", institution_id, "loginForm"]);
        self.context
            .fetch(Resource::Institution, request, StatusCode::OK)
            .await
    }
}
