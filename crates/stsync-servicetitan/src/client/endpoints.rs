use crate::error::ServiceTitanError;
use crate::types::{
    ApiBusinessUnit, ApiContact, ApiCustomer, ApiInvoice, ApiJob, ApiLocation, ApiMembership,
    PageEnvelope,
};

use super::ServiceTitanClient;

impl ServiceTitanClient {
    /// One page of customers, 1-based.
    ///
    /// # Errors
    ///
    /// See [`ServiceTitanClient::fetch_page`].
    pub async fn customers_page(
        &self,
        page: u32,
    ) -> Result<PageEnvelope<ApiCustomer>, ServiceTitanError> {
        let path = self.tenant_path("crm/v2", "customers");
        self.fetch_page(&path, page, &[]).await
    }

    /// Contacts for the given customers.
    ///
    /// Callers pass at most one customers page worth of ids, so the filter
    /// stays within the API's query-length limits.
    ///
    /// # Errors
    ///
    /// See [`ServiceTitanClient::fetch_all`].
    pub async fn contacts_for(
        &self,
        customer_ids: &[i64],
    ) -> Result<Vec<ApiContact>, ServiceTitanError> {
        if customer_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = customer_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = self.tenant_path("crm/v2", "customers/contacts");
        self.fetch_all(&path, &[("customerIds", ids)]).await
    }

    /// # Errors
    ///
    /// See [`ServiceTitanClient::fetch_all`].
    pub async fn locations(&self) -> Result<Vec<ApiLocation>, ServiceTitanError> {
        let path = self.tenant_path("crm/v2", "locations");
        self.fetch_all(&path, &[]).await
    }

    /// # Errors
    ///
    /// See [`ServiceTitanClient::fetch_all`].
    pub async fn invoices(&self) -> Result<Vec<ApiInvoice>, ServiceTitanError> {
        let path = self.tenant_path("accounting/v2", "invoices");
        self.fetch_all(&path, &[]).await
    }

    /// # Errors
    ///
    /// See [`ServiceTitanClient::fetch_all`].
    pub async fn memberships(&self) -> Result<Vec<ApiMembership>, ServiceTitanError> {
        let path = self.tenant_path("memberships/v2", "memberships");
        self.fetch_all(&path, &[]).await
    }

    /// # Errors
    ///
    /// See [`ServiceTitanClient::fetch_all`].
    pub async fn jobs(&self) -> Result<Vec<ApiJob>, ServiceTitanError> {
        let path = self.tenant_path("jpm/v2", "jobs");
        self.fetch_all(&path, &[]).await
    }

    /// # Errors
    ///
    /// See [`ServiceTitanClient::fetch_all`].
    pub async fn business_units(&self) -> Result<Vec<ApiBusinessUnit>, ServiceTitanError> {
        let path = self.tenant_path("settings/v2", "business-units");
        self.fetch_all(&path, &[]).await
    }
}
