//! Assembly of [`RawCustomer`] records from the separate API collections.
//!
//! Reference collections (locations, invoices, memberships, jobs, business
//! units) are fetched once and indexed by customer id. Customers are then
//! streamed page by page, each page's contacts are fetched in one filtered
//! request, and every customer is joined against the index.

use std::collections::{HashMap, VecDeque};

use stsync_core::{BillingReference, ContactKind, ContactMethod, Location, RawCustomer};

use crate::client::ServiceTitanClient;
use crate::error::ServiceTitanError;
use crate::pagination::stop_after_page;
use crate::types::{
    ApiBusinessUnit, ApiContact, ApiCustomer, ApiInvoice, ApiJob, ApiLocation, ApiMembership,
};

/// Per-customer lookups built from the reference collections.
///
/// Vectors keep API order, which is the only recency signal the API gives.
#[derive(Debug, Default)]
pub struct EnrichmentIndex {
    locations: HashMap<i64, Vec<Location>>,
    billing: HashMap<i64, Vec<BillingReference>>,
    membership_type: HashMap<i64, i64>,
    /// Business unit id of the last job seen, `None` if that job had none.
    last_job_unit: HashMap<i64, Option<i64>>,
    business_units: HashMap<i64, String>,
}

impl EnrichmentIndex {
    /// Fetches every reference collection and indexes it.
    ///
    /// A collection that fails to load is logged and treated as empty so one
    /// broken endpoint does not block the whole sync.
    pub async fn fetch(client: &ServiceTitanClient) -> Self {
        let locations = or_empty("locations", client.locations().await);
        let invoices = or_empty("invoices", client.invoices().await);
        let memberships = or_empty("memberships", client.memberships().await);
        let jobs = or_empty("jobs", client.jobs().await);
        let business_units = or_empty("business_units", client.business_units().await);

        let index = Self::from_parts(locations, invoices, memberships, jobs, business_units);
        tracing::info!(
            customers_with_locations = index.locations.len(),
            customers_with_invoices = index.billing.len(),
            customers_with_memberships = index.membership_type.len(),
            customers_with_jobs = index.last_job_unit.len(),
            business_units = index.business_units.len(),
            "enrichment index built"
        );
        index
    }

    /// Indexes already-fetched collections. Rows without a customer id are
    /// dropped.
    #[must_use]
    pub fn from_parts(
        locations: Vec<ApiLocation>,
        invoices: Vec<ApiInvoice>,
        memberships: Vec<ApiMembership>,
        jobs: Vec<ApiJob>,
        business_units: Vec<ApiBusinessUnit>,
    ) -> Self {
        let mut index = Self::default();

        for location in locations {
            let Some(customer_id) = location.customer_id else {
                continue;
            };
            let address = location.address.unwrap_or_default();
            index.locations.entry(customer_id).or_default().push(Location {
                street: address.street,
                city: address.city,
                zip: address.zip,
                address_label: location.name,
            });
        }

        for invoice in invoices {
            let Some(customer_id) = invoice.customer.and_then(|c| c.id) else {
                continue;
            };
            index
                .billing
                .entry(customer_id)
                .or_default()
                .push(BillingReference {
                    reference_number: invoice.reference_number,
                    date: invoice.invoice_date,
                });
        }

        for membership in memberships {
            if let (Some(customer_id), Some(type_id)) =
                (membership.customer_id, membership.membership_type_id)
            {
                index.membership_type.insert(customer_id, type_id);
            }
        }

        for job in jobs {
            if let Some(customer_id) = job.customer_id {
                index.last_job_unit.insert(customer_id, job.business_unit_id);
            }
        }

        for unit in business_units {
            if let (Some(id), Some(name)) = (unit.id, unit.name) {
                index.business_units.insert(id, name);
            }
        }

        index
    }

    /// Joins one customer with its contacts and indexed references.
    #[must_use]
    pub fn assemble(&self, customer: ApiCustomer, contacts: Vec<ContactMethod>) -> RawCustomer {
        let Some(customer_id) = customer.id else {
            return RawCustomer {
                customer_id: None,
                name: customer.name,
                contact_methods: contacts,
                ..RawCustomer::default()
            };
        };

        let last_job = self.last_job_unit.get(&customer_id);
        let business_unit_name = last_job
            .copied()
            .flatten()
            .and_then(|unit_id| self.business_units.get(&unit_id).cloned());

        RawCustomer {
            customer_id: Some(customer_id),
            name: customer.name,
            locations: self.locations.get(&customer_id).cloned().unwrap_or_default(),
            contact_methods: contacts,
            membership_type_id: self.membership_type.get(&customer_id).copied(),
            business_unit_name,
            has_past_job: last_job.is_some(),
            billing_references: self.billing.get(&customer_id).cloned().unwrap_or_default(),
        }
    }
}

fn or_empty<T>(collection: &str, result: Result<Vec<T>, ServiceTitanError>) -> Vec<T> {
    match result {
        Ok(rows) => {
            tracing::debug!(collection, rows = rows.len(), "reference collection fetched");
            rows
        }
        Err(e) => {
            tracing::error!(collection, error = %e, "reference collection fetch failed, continuing without it");
            Vec::new()
        }
    }
}

/// Groups contacts by customer id, keeping API order within each customer.
///
/// Phone-type contacts prefer `phoneSettings.phoneNumber` over the raw
/// `value`; everything else uses `value`.
#[must_use]
pub fn group_contacts(contacts: Vec<ApiContact>) -> HashMap<i64, Vec<ContactMethod>> {
    let mut grouped: HashMap<i64, Vec<ContactMethod>> = HashMap::new();
    for contact in contacts {
        let Some(customer_id) = contact.customer_id else {
            continue;
        };
        let kind = ContactKind::from_api(contact.kind.as_deref().unwrap_or_default());
        let phone_number = contact
            .phone_settings
            .and_then(|p| p.phone_number)
            .filter(|n| !n.trim().is_empty());
        let value = match phone_number {
            Some(number) if kind.is_phone() => Some(number),
            _ => contact.value,
        };
        if let Some(value) = value {
            grouped
                .entry(customer_id)
                .or_default()
                .push(ContactMethod::new(kind, value));
        }
    }
    grouped
}

/// Streams assembled customers one at a time, fetching customer pages on
/// demand.
pub struct CustomerStream<'a> {
    client: &'a ServiceTitanClient,
    index: EnrichmentIndex,
    buffer: VecDeque<RawCustomer>,
    next_page: u32,
    done: bool,
}

impl<'a> CustomerStream<'a> {
    #[must_use]
    pub fn new(client: &'a ServiceTitanClient, index: EnrichmentIndex) -> Self {
        Self {
            client,
            index,
            buffer: VecDeque::new(),
            next_page: 1,
            done: false,
        }
    }

    /// Builds the enrichment index, then returns a stream positioned at the
    /// first customers page.
    pub async fn open(client: &'a ServiceTitanClient) -> Self {
        let index = EnrichmentIndex::fetch(client).await;
        Self::new(client, index)
    }

    /// Returns the next customer, or `None` once every page is consumed.
    ///
    /// # Errors
    ///
    /// Returns the error from a failed customers page fetch. The stream is
    /// finished after an error.
    pub async fn next_customer(&mut self) -> Result<Option<RawCustomer>, ServiceTitanError> {
        loop {
            if let Some(customer) = self.buffer.pop_front() {
                return Ok(Some(customer));
            }
            if self.done {
                return Ok(None);
            }
            if let Err(e) = self.load_next_page().await {
                self.done = true;
                return Err(e);
            }
        }
    }

    async fn load_next_page(&mut self) -> Result<(), ServiceTitanError> {
        let page = self.next_page;
        if page > self.client.max_pages() {
            tracing::warn!(
                max_pages = self.client.max_pages(),
                "customer page limit reached, remaining pages were not fetched"
            );
            self.done = true;
            return Ok(());
        }

        let envelope = match self.client.customers_page(page).await {
            Ok(envelope) => envelope,
            Err(ServiceTitanError::NotFound { .. }) => {
                tracing::debug!(page, "customers page not found, treating as end of data");
                self.done = true;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        self.next_page += 1;

        let has_more = envelope.has_more();
        let customers = envelope.data;
        if stop_after_page(customers.len(), self.client.page_size(), has_more).is_some() {
            self.done = true;
        }

        let ids: Vec<i64> = customers.iter().filter_map(|c| c.id).collect();
        let mut contacts = match self.client.contacts_for(&ids).await {
            Ok(rows) => group_contacts(rows),
            Err(e) => {
                tracing::error!(page, error = %e, "contacts fetch failed for customers page, continuing without contacts");
                HashMap::new()
            }
        };

        tracing::info!(page, customers = customers.len(), "customers page fetched");
        for customer in customers {
            let methods = customer
                .id
                .and_then(|id| contacts.remove(&id))
                .unwrap_or_default();
            self.buffer.push_back(self.index.assemble(customer, methods));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "assemble_test.rs"]
mod tests;
