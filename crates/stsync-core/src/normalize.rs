//! Flattening of a [`RawCustomer`] into a [`FlatContactRow`].
//!
//! Variable-length collections become delimiter-joined `all_*` columns, and
//! `primary_*` columns are taken from the last location. The API delivers
//! locations oldest first and carries no reliable timestamp on every entry,
//! so arrival order is the recency signal: last one wins, nothing is sorted.
//!
//! Missing values never fail normalization. A missing sub-field inside a
//! location or invoice becomes `""` at its position; a wholly empty collection
//! becomes a literal sentinel string that downstream consumers match on.
//!
//! Within a joined column, a backslash or delimiter that is part of a value is
//! escaped with a backslash, so [`split_joined`] always recovers one entry per
//! location or invoice.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::contact_row::FlatContactRow;
use crate::customer::{BillingReference, ContactMethod, Location, RawCustomer};

pub const DEFAULT_DELIMITER: &str = ";";

/// Escape character used inside joined columns. Delimiters may not contain it.
pub const ESCAPE: char = '\\';

pub const NO_CONTACT_NAME: &str = "No Contact Name";
pub const NO_PRIMARY_STREET: &str = "No Primary Street";
pub const NO_PRIMARY_CITY: &str = "No Primary City";
pub const NO_PRIMARY_ZIP: &str = "No Primary Zip";
pub const NO_PRIMARY_ADDRESS: &str = "No Primary Address";
pub const NO_BILLING_NAMES: &str = "No Billing Names";
pub const NO_BILLING_DATES: &str = "No Billing Dates";
pub const NO_PAST_JOB: &str = "No Past Job";
pub const UNKNOWN_BUSINESS_UNIT: &str = "Unknown Business Unit";

pub const VIP_YES: &str = "YES";
pub const VIP_NO: &str = "NO";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("customer record has no customer_id (name: {})", name.as_deref().unwrap_or("<none>"))]
    MissingKey { name: Option<String> },
}

/// Which memberships mark a customer as VIP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VipPolicy {
    /// Any membership at all.
    AnyMembership,
    /// Only memberships whose type id is in the set.
    TypeIds(BTreeSet<i64>),
}

impl VipPolicy {
    #[must_use]
    pub fn is_vip(&self, membership_type_id: Option<i64>) -> bool {
        match (self, membership_type_id) {
            (_, None) => false,
            (VipPolicy::AnyMembership, Some(_)) => true,
            (VipPolicy::TypeIds(ids), Some(id)) => ids.contains(&id),
        }
    }
}

/// Per-run parameters for [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub delimiter: String,
    pub vip: VipPolicy,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            vip: VipPolicy::AnyMembership,
        }
    }
}

/// Normalizes one customer into its flat row.
///
/// Pure: the same input and options always produce the same row.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingKey`] if the customer has no
/// `customer_id`; there is nothing to upsert on, so no row is produced.
pub fn normalize(
    raw: RawCustomer,
    options: &NormalizeOptions,
) -> Result<FlatContactRow, NormalizeError> {
    let Some(customer_id) = raw.customer_id else {
        return Err(NormalizeError::MissingKey { name: raw.name });
    };

    let delimiter = options.delimiter.as_str();

    let (phones, emails) = dedup_contact_methods(&raw.contact_methods);
    let addresses = AddressColumns::from_locations(&raw.locations);
    let billing = BillingColumns::from_references(&raw.billing_references);

    let contact_name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| NO_CONTACT_NAME.to_string());

    let business_unit_name = match raw.business_unit_name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name,
        None if raw.has_past_job => UNKNOWN_BUSINESS_UNIT.to_string(),
        None => NO_PAST_JOB.to_string(),
    };

    let is_vip = if options.vip.is_vip(raw.membership_type_id) {
        VIP_YES
    } else {
        VIP_NO
    };

    Ok(FlatContactRow {
        customer_id,
        contact_name,
        all_phone_numbers: join_escaped(&phones, delimiter),
        all_emails: join_escaped(&emails, delimiter),
        primary_street: last_or(&addresses.streets, NO_PRIMARY_STREET),
        primary_city: last_or(&addresses.cities, NO_PRIMARY_CITY),
        primary_zip: last_or(&addresses.zips, NO_PRIMARY_ZIP),
        primary_address: last_or(&addresses.labels, NO_PRIMARY_ADDRESS),
        all_streets: join_escaped(&addresses.streets, delimiter),
        all_cities: join_escaped(&addresses.cities, delimiter),
        all_zips: join_escaped(&addresses.zips, delimiter),
        all_addresses: join_escaped(&addresses.labels, delimiter),
        is_vip: is_vip.to_string(),
        business_unit_name,
        billingname: join_or(&billing.names, delimiter, NO_BILLING_NAMES),
        billingline1: join_or(&billing.dates, delimiter, NO_BILLING_DATES),
    })
}

/// Parallel address columns; index `i` of every vector is location `i`.
#[derive(Debug, Default)]
struct AddressColumns {
    streets: Vec<String>,
    cities: Vec<String>,
    zips: Vec<String>,
    labels: Vec<String>,
}

impl AddressColumns {
    fn from_locations(locations: &[Location]) -> Self {
        let mut columns = Self::default();
        for location in locations {
            columns.streets.push(field(location.street.as_deref()));
            columns.cities.push(field(location.city.as_deref()));
            columns.zips.push(field(location.zip.as_deref()));
            columns.labels.push(field(location.address_label.as_deref()));
        }
        columns
    }
}

/// Parallel invoice columns; index `i` of both vectors is reference `i`.
#[derive(Debug, Default)]
struct BillingColumns {
    names: Vec<String>,
    dates: Vec<String>,
}

impl BillingColumns {
    fn from_references(references: &[BillingReference]) -> Self {
        let mut columns = Self::default();
        for reference in references {
            columns
                .names
                .push(field(reference.reference_number.as_deref()));
            columns.dates.push(field(reference.date.as_deref()));
        }
        columns
    }
}

/// Splits contact methods into deduplicated phone and email lists.
///
/// Order follows first appearance. The comparison key is normalized (digits
/// only for phones, lowercase for emails) but the output keeps the trimmed
/// value of the first occurrence.
fn dedup_contact_methods(methods: &[ContactMethod]) -> (Vec<String>, Vec<String>) {
    let mut phones = Vec::new();
    let mut emails = Vec::new();
    let mut seen_phones = HashSet::new();
    let mut seen_emails = HashSet::new();

    for method in methods {
        let value = method.value.trim();
        if value.is_empty() {
            continue;
        }

        if method.kind.is_phone() {
            if seen_phones.insert(phone_key(value)) {
                phones.push(value.to_string());
            }
        } else if method.kind.is_email()
            && is_valid_email(value)
            && seen_emails.insert(value.to_lowercase())
        {
            emails.push(value.to_string());
        }
    }

    (phones, emails)
}

/// Dedup key for a phone number: its digits, so `555-1234` and `555.1234`
/// collide. Values without digits fall back to lowercase text.
fn phone_key(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        value.to_lowercase()
    } else {
        digits
    }
}

/// Returns `true` for values shaped like an email address. Contact records
/// of type `Email` sometimes carry phone numbers or free text.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    !value.chars().all(|c| c.is_ascii_digit()) && EMAIL_RE.is_match(value)
}

/// A location or invoice component as received; missing becomes `""`.
fn field(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn last_or(values: &[String], sentinel: &str) -> String {
    values
        .last()
        .cloned()
        .unwrap_or_else(|| sentinel.to_string())
}

fn join_or(values: &[String], delimiter: &str, sentinel: &str) -> String {
    if values.is_empty() {
        sentinel.to_string()
    } else {
        join_escaped(values, delimiter)
    }
}

fn escape(value: &str, delimiter: &str) -> String {
    if !value.contains(ESCAPE) && !value.contains(delimiter) {
        return value.to_string();
    }
    value
        .replace(ESCAPE, &format!("{ESCAPE}{ESCAPE}"))
        .replace(delimiter, &format!("{ESCAPE}{delimiter}"))
}

/// Joins `values` with `delimiter`, escaping any delimiter or backslash that
/// occurs inside a value.
#[must_use]
pub fn join_escaped(values: &[String], delimiter: &str) -> String {
    values
        .iter()
        .map(|v| escape(v, delimiter))
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Inverse of [`join_escaped`]. An empty string yields no entries, so a
/// single blank value and an empty column both read back as empty.
#[must_use]
pub fn split_joined(joined: &str, delimiter: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut rest = joined;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(ESCAPE) {
            if let Some(tail) = after.strip_prefix(delimiter) {
                current.push_str(delimiter);
                rest = tail;
            } else if let Some(tail) = after.strip_prefix(ESCAPE) {
                current.push(ESCAPE);
                rest = tail;
            } else {
                current.push(ESCAPE);
                rest = after;
            }
        } else if let Some(tail) = rest.strip_prefix(delimiter) {
            entries.push(std::mem::take(&mut current));
            rest = tail;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                current.push(c);
            }
            rest = chars.as_str();
        }
    }
    entries.push(current);
    entries
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
