use std::collections::BTreeSet;

use super::*;
use crate::customer::ContactKind;

fn location(street: &str, city: &str, zip: &str, label: &str) -> Location {
    Location {
        street: Some(street.to_string()),
        city: Some(city.to_string()),
        zip: Some(zip.to_string()),
        address_label: Some(label.to_string()),
    }
}

fn customer(id: i64) -> RawCustomer {
    RawCustomer {
        customer_id: Some(id),
        name: Some("Ada Lovelace".to_string()),
        ..RawCustomer::default()
    }
}

fn split(joined: &str, delimiter: &str) -> Vec<String> {
    split_joined(joined, delimiter)
}

#[test]
fn two_locations_join_and_last_is_primary() {
    let raw = RawCustomer {
        locations: vec![
            location("A St", "Austin", "78701", "Home"),
            location("B Ave", "Boston", "02108", "Office"),
        ],
        ..customer(1)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.customer_id, 1);
    assert_eq!(row.all_streets, "A St;B Ave");
    assert_eq!(row.all_cities, "Austin;Boston");
    assert_eq!(row.all_zips, "78701;02108");
    assert_eq!(row.all_addresses, "Home;Office");
    assert_eq!(row.primary_street, "B Ave");
    assert_eq!(row.primary_city, "Boston");
    assert_eq!(row.primary_zip, "02108");
    assert_eq!(row.primary_address, "Office");
}

#[test]
fn address_sequences_stay_aligned_for_any_location_count() {
    for n in 1..=6 {
        let locations = (0..n)
            .map(|i| {
                location(
                    &format!("{i} St"),
                    &format!("City{i}"),
                    &format!("{i:05}"),
                    &format!("Site {i}"),
                )
            })
            .collect();
        let raw = RawCustomer {
            locations,
            ..customer(10)
        };

        let row = normalize(raw, &NormalizeOptions::default()).unwrap();

        let streets = split(&row.all_streets, ";");
        let cities = split(&row.all_cities, ";");
        let zips = split(&row.all_zips, ";");
        let labels = split(&row.all_addresses, ";");
        assert_eq!(streets.len(), n, "streets for n={n}");
        assert_eq!(cities.len(), n, "cities for n={n}");
        assert_eq!(zips.len(), n, "zips for n={n}");
        assert_eq!(labels.len(), n, "labels for n={n}");
        assert_eq!(Some(&row.primary_street), streets.last());
        assert_eq!(Some(&row.primary_city), cities.last());
        assert_eq!(Some(&row.primary_zip), zips.last());
        assert_eq!(Some(&row.primary_address), labels.last());
    }
}

#[test]
fn missing_location_field_keeps_its_slot() {
    let raw = RawCustomer {
        locations: vec![
            location("A St", "Austin", "78701", "Home"),
            Location {
                street: Some("B Ave".to_string()),
                city: None,
                zip: Some("02108".to_string()),
                address_label: None,
            },
            location("C Rd", "Chicago", "60601", "Cabin"),
        ],
        ..customer(2)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.all_streets, "A St;B Ave;C Rd");
    assert_eq!(row.all_cities, "Austin;;Chicago");
    assert_eq!(row.all_addresses, "Home;;Cabin");
    assert_eq!(row.primary_city, "Chicago");
}

#[test]
fn primary_is_blank_when_last_location_lacks_the_field() {
    let raw = RawCustomer {
        locations: vec![
            location("A St", "Austin", "78701", "Home"),
            Location {
                street: Some("B Ave".to_string()),
                ..Location::default()
            },
        ],
        ..customer(3)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.primary_street, "B Ave");
    assert_eq!(row.primary_city, "");
    assert_eq!(row.all_cities, "Austin;");
}

#[test]
fn delimiter_inside_a_value_keeps_columns_aligned() {
    let raw = RawCustomer {
        locations: vec![location("Suite 1;Bldg 2", "Austin", "78701", "HQ")],
        billing_references: vec![BillingReference {
            reference_number: Some("INV;7".to_string()),
            date: Some("2024-05-06".to_string()),
        }],
        ..customer(30)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.all_streets, "Suite 1\\;Bldg 2");
    assert_eq!(split(&row.all_streets, ";"), vec!["Suite 1;Bldg 2"]);
    assert_eq!(split(&row.all_cities, ";").len(), 1);
    assert_eq!(row.primary_street, "Suite 1;Bldg 2");
    assert_eq!(split(&row.billingname, ";"), vec!["INV;7"]);
    assert_eq!(split(&row.billingline1, ";").len(), 1);
}

#[test]
fn escaped_columns_split_back_to_original_values() {
    let values = vec![
        "plain".to_string(),
        "back\\slash".to_string(),
        "trailing\\".to_string(),
        "a | b".to_string(),
        String::new(),
    ];

    for delimiter in [";", " | "] {
        let joined = join_escaped(&values, delimiter);
        assert_eq!(split_joined(&joined, delimiter), values, "delimiter {delimiter:?}");
    }
}

#[test]
fn name_and_location_fields_are_copied_verbatim() {
    let raw = RawCustomer {
        name: Some("  Ada Lovelace ".to_string()),
        locations: vec![location(" 1 Main St ", "Austin ", "78701", " Home")],
        ..customer(31)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.contact_name, "  Ada Lovelace ");
    assert_eq!(row.all_streets, " 1 Main St ");
    assert_eq!(row.primary_city, "Austin ");
    assert_eq!(row.primary_address, " Home");
}

#[test]
fn no_locations_produce_sentinels_and_empty_sequences() {
    let row = normalize(customer(4), &NormalizeOptions::default()).unwrap();

    assert_eq!(row.primary_street, NO_PRIMARY_STREET);
    assert_eq!(row.primary_city, NO_PRIMARY_CITY);
    assert_eq!(row.primary_zip, NO_PRIMARY_ZIP);
    assert_eq!(row.primary_address, NO_PRIMARY_ADDRESS);
    assert_eq!(row.all_streets, "");
    assert_eq!(row.all_cities, "");
    assert_eq!(row.all_zips, "");
    assert_eq!(row.all_addresses, "");
}

#[test]
fn primary_follows_arrival_order_not_any_date() {
    // The newer-looking label comes first; position alone decides.
    let raw = RawCustomer {
        locations: vec![
            location("New St", "Austin", "78701", "Moved in 2024"),
            location("Old St", "Austin", "78702", "Moved in 2010"),
        ],
        ..customer(5)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.primary_street, "Old St");
}

#[test]
fn normalize_is_idempotent() {
    let raw = RawCustomer {
        locations: vec![location("A St", "Austin", "78701", "Home")],
        contact_methods: vec![
            ContactMethod::new(ContactKind::Phone, "555-1234"),
            ContactMethod::new(ContactKind::Email, "ada@example.com"),
        ],
        membership_type_id: Some(9),
        business_unit_name: Some("HVAC".to_string()),
        has_past_job: true,
        billing_references: vec![BillingReference {
            reference_number: Some("INV-1".to_string()),
            date: Some("2024-01-02".to_string()),
        }],
        ..customer(6)
    };
    let options = NormalizeOptions::default();

    let first = normalize(raw.clone(), &options).unwrap();
    let second = normalize(raw, &options).unwrap();

    assert_eq!(first, second);
}

#[test]
fn phone_numbers_dedup_on_digits_and_keep_first_form() {
    let raw = RawCustomer {
        contact_methods: vec![
            ContactMethod::new(ContactKind::Phone, "555-1234"),
            ContactMethod::new(ContactKind::MobilePhone, "555.1234"),
            ContactMethod::new(ContactKind::Phone, " 555-1234 "),
            ContactMethod::new(ContactKind::Fax, "555-9999"),
        ],
        ..customer(7)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.all_phone_numbers, "555-1234;555-9999");
}

#[test]
fn emails_dedup_case_insensitively_and_drop_invalid() {
    let raw = RawCustomer {
        contact_methods: vec![
            ContactMethod::new(ContactKind::Email, "Ada@Example.com"),
            ContactMethod::new(ContactKind::Email, "ada@example.com"),
            ContactMethod::new(ContactKind::Email, "5551234"),
            ContactMethod::new(ContactKind::Email, "not an email"),
            ContactMethod::new(ContactKind::Email, "bob@example.org"),
        ],
        ..customer(8)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.all_emails, "Ada@Example.com;bob@example.org");
}

#[test]
fn blank_and_unknown_contact_methods_are_ignored() {
    let raw = RawCustomer {
        contact_methods: vec![
            ContactMethod::new(ContactKind::Phone, "   "),
            ContactMethod::new(ContactKind::Other("Pager".to_string()), "555-0000"),
        ],
        ..customer(9)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.all_phone_numbers, "");
    assert_eq!(row.all_emails, "");
}

#[test]
fn is_valid_email_cases() {
    assert!(is_valid_email("ada@example.com"));
    assert!(is_valid_email(" first.last+tag@sub.example.co "));
    assert!(!is_valid_email("ada@example"));
    assert!(!is_valid_email("5551234"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email(""));
}

#[test]
fn vip_any_membership() {
    let options = NormalizeOptions::default();

    let member = RawCustomer {
        membership_type_id: Some(3),
        ..customer(11)
    };
    assert_eq!(normalize(member, &options).unwrap().is_vip, VIP_YES);
    assert_eq!(normalize(customer(12), &options).unwrap().is_vip, VIP_NO);
}

#[test]
fn vip_restricted_to_type_ids() {
    let options = NormalizeOptions {
        vip: VipPolicy::TypeIds(BTreeSet::from([42])),
        ..NormalizeOptions::default()
    };

    let gold = RawCustomer {
        membership_type_id: Some(42),
        ..customer(13)
    };
    let basic = RawCustomer {
        membership_type_id: Some(7),
        ..customer(14)
    };
    assert_eq!(normalize(gold, &options).unwrap().is_vip, VIP_YES);
    assert_eq!(normalize(basic, &options).unwrap().is_vip, VIP_NO);
}

#[test]
fn missing_customer_id_is_rejected() {
    let raw = RawCustomer {
        customer_id: None,
        name: Some("Nobody".to_string()),
        ..RawCustomer::default()
    };

    let err = normalize(raw, &NormalizeOptions::default()).unwrap_err();

    assert_eq!(
        err,
        NormalizeError::MissingKey {
            name: Some("Nobody".to_string())
        }
    );
    assert!(err.to_string().contains("Nobody"));
}

#[test]
fn contact_name_sentinel() {
    let blank = RawCustomer {
        name: Some("  ".to_string()),
        ..customer(15)
    };
    let missing = RawCustomer {
        name: None,
        ..customer(16)
    };
    let options = NormalizeOptions::default();

    assert_eq!(normalize(blank, &options).unwrap().contact_name, NO_CONTACT_NAME);
    assert_eq!(normalize(missing, &options).unwrap().contact_name, NO_CONTACT_NAME);
}

#[test]
fn business_unit_sentinels() {
    let options = NormalizeOptions::default();

    let named = RawCustomer {
        business_unit_name: Some("Plumbing".to_string()),
        has_past_job: true,
        ..customer(17)
    };
    let unresolved = RawCustomer {
        has_past_job: true,
        ..customer(18)
    };

    assert_eq!(normalize(named, &options).unwrap().business_unit_name, "Plumbing");
    assert_eq!(
        normalize(unresolved, &options).unwrap().business_unit_name,
        UNKNOWN_BUSINESS_UNIT
    );
    assert_eq!(
        normalize(customer(19), &options).unwrap().business_unit_name,
        NO_PAST_JOB
    );
}

#[test]
fn billing_references_stay_aligned() {
    let raw = RawCustomer {
        billing_references: vec![
            BillingReference {
                reference_number: Some("INV-1".to_string()),
                date: Some("2024-01-02".to_string()),
            },
            BillingReference {
                reference_number: Some("INV-2".to_string()),
                date: None,
            },
            BillingReference {
                reference_number: None,
                date: Some("2024-03-04".to_string()),
            },
        ],
        ..customer(20)
    };

    let row = normalize(raw, &NormalizeOptions::default()).unwrap();

    assert_eq!(row.billingname, "INV-1;INV-2;");
    assert_eq!(row.billingline1, "2024-01-02;;2024-03-04");
}

#[test]
fn no_billing_references_produce_sentinels() {
    let row = normalize(customer(21), &NormalizeOptions::default()).unwrap();

    assert_eq!(row.billingname, NO_BILLING_NAMES);
    assert_eq!(row.billingline1, NO_BILLING_DATES);
}

#[test]
fn custom_delimiter_is_used_everywhere() {
    let raw = RawCustomer {
        locations: vec![
            location("A St", "Austin", "78701", "Home"),
            location("B Ave", "Boston", "02108", "Office"),
        ],
        contact_methods: vec![
            ContactMethod::new(ContactKind::Phone, "555-1234"),
            ContactMethod::new(ContactKind::Phone, "555-9999"),
        ],
        ..customer(22)
    };
    let options = NormalizeOptions {
        delimiter: " | ".to_string(),
        ..NormalizeOptions::default()
    };

    let row = normalize(raw, &options).unwrap();

    assert_eq!(row.all_streets, "A St | B Ave");
    assert_eq!(row.all_phone_numbers, "555-1234 | 555-9999");
}
