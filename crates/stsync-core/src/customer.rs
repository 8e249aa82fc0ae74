//! Raw customer records as assembled from the upstream field-service API.
//!
//! These are read-only inputs to [`crate::normalize`]. Collections keep the
//! order in which the API returned them; for `locations` that order is the
//! only recency signal available (later entries are more recent).

use serde::{Deserialize, Serialize};

/// One customer with its nested sub-collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCustomer {
    /// Business key for the upsert. `None` makes the record unusable.
    pub customer_id: Option<i64>,
    pub name: Option<String>,
    /// Service locations, oldest first.
    pub locations: Vec<Location>,
    pub contact_methods: Vec<ContactMethod>,
    pub membership_type_id: Option<i64>,
    /// Business unit of the customer's most recent job, when resolvable.
    pub business_unit_name: Option<String>,
    /// Whether any job exists for the customer, even if its business unit
    /// could not be resolved to a name.
    pub has_past_job: bool,
    pub billing_references: Vec<BillingReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    /// Human name for the site (the API's location `name`).
    pub address_label: Option<String>,
}

/// Contact channel type as reported by the API's `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Phone,
    MobilePhone,
    Fax,
    Email,
    Other(String),
}

impl ContactKind {
    /// Maps the API's free-form `type` string; matching is case-insensitive.
    #[must_use]
    pub fn from_api(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "phone" => ContactKind::Phone,
            "mobilephone" => ContactKind::MobilePhone,
            "fax" => ContactKind::Fax,
            "email" => ContactKind::Email,
            _ => ContactKind::Other(kind.to_string()),
        }
    }

    #[must_use]
    pub fn is_phone(&self) -> bool {
        matches!(
            self,
            ContactKind::Phone | ContactKind::MobilePhone | ContactKind::Fax
        )
    }

    #[must_use]
    pub fn is_email(&self) -> bool {
        matches!(self, ContactKind::Email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMethod {
    pub kind: ContactKind,
    pub value: String,
}

impl ContactMethod {
    pub fn new(kind: ContactKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// An invoice reference attached to the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingReference {
    pub reference_number: Option<String>,
    pub date: Option<String>,
}
