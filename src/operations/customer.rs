use super::{Context, non_blank};
use crate::error::{FinicityError, Resource};
use crate::models::{Customer, CustomerType, Customers};
use crate::transport::Request;
use crate::xml::to_xml;
use log::info;
use reqwest::StatusCode;

/// Filters for [`CustomerOperations::get_customers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub username: Option<String>,
    pub start: Option<u32>,
    pub limit: Option<u32>,
    pub customer_type: Option<CustomerType>,
}

impl CustomerQuery {
    fn apply(&self, request: Request) -> Request {
        request
            .query_opt("search", non_blank(self.search.as_deref()))
            .query_opt("username", non_blank(self.username.as_deref()))
            .query_opt("start", self.start)
            .query_opt("limit", self.limit)
            .query_opt("type", self.customer_type)
    }
}

#[derive(Debug, Clone)]
pub struct CustomerOperations {
    context: Context,
}

impl CustomerOperations {
    pub(crate) fn new(context: Context) -> Self {
        Self { context }
    }

    pub async fn get_customers(&self, query: &CustomerQuery) -> Result<Vec<Customer>, FinicityError> {
        let request = query.apply(Request::get(&["v1", "customers"]));
        let customers: Customers = self
            .context
            .fetch(Resource::Customer, request, StatusCode::OK)
            .await?;
        Ok(customers.customers)
    }

    pub async fn get_customer(&self, customer_id: &str) -> Result<Customer, FinicityError> {
        let request = Request::get(&["v1", "customers", customer_id]);
        self.context
            .fetch(Resource::Customer, request, StatusCode::OK)
            .await
    }

    /// Register a customer that may only link test institutions.
    pub async fn add_testing_customer(&self, customer: &Customer) -> Result<Customer, FinicityError> {
        self.add(CustomerType::Testing, customer).await
    }

    /// Register a billable customer.
    pub async fn add_customer(&self, customer: &Customer) -> Result<Customer, FinicityError> {
        self.add(CustomerType::Active, customer).await
    }

    /// Update name fields of an existing customer; `customer.id` is required.
    pub async fn modify_customer(&self, customer: &Customer) -> Result<(), FinicityError> {
        let id = customer
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(FinicityError::InvalidParameter("customer id is required"))?;
        info!("Modifying customer {id}");
        let body = to_xml(&Customer {
            id: None,
            ..customer.clone()
        })?;
        let request = Request::put(&["v1", "customers", id]).body(body);
        self.context.execute(Resource::Customer, request).await
    }

    pub async fn delete_customer(&self, customer_id: &str) -> Result<(), FinicityError> {
        info!("Deleting customer {customer_id}");
        let request = Request::delete(&["v1", "customers", customer_id]);
        self.context.execute(Resource::Customer, request).await
    }

    async fn add(&self, kind: CustomerType, customer: &Customer) -> Result<Customer, FinicityError> {
        info!("Adding {kind} customer");
        let kind = kind.to_string();
        let request = Request::post(&["v1", "customers", &kind]).body(to_xml(customer)?);
        self.context
            .fetch(Resource::Customer, request, StatusCode::CREATED)
            .await
    }
}
