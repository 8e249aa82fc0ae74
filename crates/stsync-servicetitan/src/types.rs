//! `ServiceTitan` API response types.
//!
//! Only the fields the sync reads are modelled; everything else in the
//! payloads is ignored. Every list endpoint wraps its rows in a
//! `{ "data": [...], "hasMore": ... }` envelope ([`PageEnvelope`]).

use serde::Deserialize;

/// Paged list envelope shared by all v2 list endpoints.
///
/// `hasMore` is normally top level; some tenants return it nested under
/// `pagination`. Both are accepted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> PageEnvelope<T> {
    /// The server's `hasMore` flag, if it sent one.
    #[must_use]
    pub fn has_more(&self) -> Option<bool> {
        self.has_more
            .or_else(|| self.pagination.as_ref().and_then(|p| p.has_more))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub has_more: Option<bool>,
}

/// `POST /connect/token` response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Row of `crm/v2/tenant/{t}/customers`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCustomer {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Row of `crm/v2/tenant/{t}/customers/contacts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContact {
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub phone_settings: Option<PhoneSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneSettings {
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Row of `crm/v2/tenant/{t}/locations`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocation {
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<ApiAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiAddress {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// Row of `accounting/v2/tenant/{t}/invoices`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInvoice {
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub customer: Option<ApiCustomerRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCustomerRef {
    #[serde(default)]
    pub id: Option<i64>,
}

/// Row of `memberships/v2/tenant/{t}/memberships`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMembership {
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub membership_type_id: Option<i64>,
}

/// Row of `jpm/v2/tenant/{t}/jobs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiJob {
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub business_unit_id: Option<i64>,
}

/// Row of `settings/v2/tenant/{t}/business-units`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiBusinessUnit {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}
