use serde::Serialize;

/// Denormalized, fixed-column representation of one customer, as stored in
/// the destination table. Field names are the column names.
///
/// Every `all_*` field is already serialized to its wire form (delimiter
/// joined). `primary_*` fields always equal the last entry of the matching
/// `all_*` sequence, or a sentinel when that sequence is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatContactRow {
    pub customer_id: i64,
    pub contact_name: String,
    pub all_phone_numbers: String,
    pub all_emails: String,
    pub all_streets: String,
    pub all_cities: String,
    pub all_zips: String,
    pub all_addresses: String,
    pub primary_street: String,
    pub primary_city: String,
    pub primary_zip: String,
    pub primary_address: String,
    pub is_vip: String,
    pub business_unit_name: String,
    pub billingname: String,
    pub billingline1: String,
}
