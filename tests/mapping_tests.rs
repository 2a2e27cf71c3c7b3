use datacite_entries::entry::{
    map_initial_author_to_entry, map_initial_contributor_to_entry, map_initial_resource,
};
use datacite_entries::serialize::{serialize_authors, AuthorPayload, ContributorPayload};
use datacite_entries::{
    AffiliationTag, AuthorEntry, ContributorEntry, EntryType, FormLimits, ResourceForm,
};
use serde_json::json;
use std::collections::HashSet;

#[test]
fn test_person_author_scenario() {
    let raw = json!({
        "type": "person",
        "orcid": "https://orcid.org/0000-0002-1825-0097",
        "firstName": " Jo ",
        "lastName": " Doe "
    });

    match map_initial_author_to_entry(&raw) {
        Some(AuthorEntry::Person(p)) => {
            assert_eq!(p.orcid, "0000-0002-1825-0097");
            assert_eq!(p.first_name, "Jo");
            assert_eq!(p.last_name, "Doe");
            assert!(p.email.is_empty());
            assert!(!p.is_contact);
        }
        other => panic!("expected person, got {other:?}"),
    }
}

#[test]
fn test_mapped_entries_get_fresh_ids() {
    let raw = json!({"lastName": "Doe"});
    let a = map_initial_author_to_entry(&raw).unwrap();
    let b = map_initial_author_to_entry(&raw).unwrap();
    assert_ne!(a.id(), b.id());
}

#[test]
fn test_contributor_with_organization_role_is_institution() {
    let raw = json!({"roles": ["HostingInstitution"], "firstName": "X", "lastName": "Y"});
    let entry = map_initial_contributor_to_entry(&raw).unwrap();
    assert_eq!(entry.entry_type(), EntryType::Institution);
}

#[test]
fn test_contributor_person_keeps_roles() {
    let raw = json!({
        "type": "person",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "roles": ["DataCollector", "DataCollector", "Editor"]
    });
    match map_initial_contributor_to_entry(&raw) {
        Some(ContributorEntry::Person(p)) => {
            let roles: Vec<&str> = p.roles.iter().map(|r| r.value.as_str()).collect();
            assert_eq!(roles, vec!["Data Collector", "Editor"]);
        }
        other => panic!("expected person, got {other:?}"),
    }
}

#[test]
fn test_affiliation_round_trip() {
    let raw = json!({
        "type": "person",
        "lastName": "Doe",
        "affiliations": [
            {"value": "University of Oxford", "rorId": "https://ror.org/052gg0110"},
            {"name": "MIT", "identifier": "https://ror.org/042nb2s44"}
        ]
    });
    let entry = map_initial_author_to_entry(&raw).unwrap();
    let payload = serialize_authors(&[entry]);

    let affiliations = match &payload[0] {
        AuthorPayload::Person(p) => p.affiliations.clone(),
        AuthorPayload::Institution(_) => panic!("expected person"),
    };
    let expected: HashSet<AffiliationTag> = [
        AffiliationTag::new("University of Oxford", Some("https://ror.org/052gg0110".into())),
        AffiliationTag::new("MIT", Some("https://ror.org/042nb2s44".into())),
    ]
    .into_iter()
    .collect();

    assert_eq!(affiliations.len(), 2);
    assert_eq!(affiliations.into_iter().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_full_resource_to_payload() {
    let raw = json!({
        "resourceId": "12",
        "year": 2024,
        "resourceTypeId": 3,
        "titles": [
            {"title": " Ocean Temperatures ", "titleType": "MainTitle"},
            {"title": "", "titleType": "Subtitle"}
        ],
        "licenses": ["CC-BY-4.0", {"rightsIdentifier": "MIT"}, ""],
        "descriptions": [
            {"descriptionType": "Abstract", "description": " Measured at sea. "},
            {"descriptionType": "Methods", "description": "  "}
        ],
        "dates": [{"dateType": "Collected", "startDate": "2020-01-01"}],
        "authors": [
            {"type": "person", "firstName": "Jo", "lastName": "Doe", "isContact": true, "email": "jo@example.org"},
            null,
            {"type": "institution", "institutionName": "GFZ", "affiliations": [{"value": "GFZ", "rorId": "https://ror.org/04z8jg394"}]}
        ],
        "contributors": [
            {"roles": "Sponsor", "institutionName": "Funding Body"}
        ]
    });

    let form = map_initial_resource(&raw, FormLimits::default());
    assert!(form.is_submit_ready());
    let payload = serde_json::to_value(form.to_payload()).unwrap();

    assert_eq!(payload["resourceId"], 12);
    assert_eq!(payload["year"], 2024);
    assert_eq!(payload["resourceType"], 3);
    assert_eq!(payload["licenses"], json!(["CC-BY-4.0", "MIT"]));
    assert_eq!(
        payload["titles"],
        json!([{"title": "Ocean Temperatures", "titleType": "main-title"}])
    );
    assert_eq!(
        payload["descriptions"],
        json!([{"descriptionType": "Abstract", "description": "Measured at sea."}])
    );
    assert_eq!(
        payload["dates"],
        json!([{"dateType": "Collected", "startDate": "2020-01-01", "endDate": null}])
    );

    let authors = payload["authors"].as_array().unwrap();
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0]["type"], "person");
    assert_eq!(authors[0]["position"], 0);
    assert_eq!(authors[1]["type"], "institution");
    assert_eq!(authors[1]["rorId"], "https://ror.org/04z8jg394");
    assert_eq!(authors[1]["position"], 1);

    let contributors = payload["contributors"].as_array().unwrap();
    assert_eq!(contributors[0]["type"], "institution");
    assert_eq!(contributors[0]["roles"], json!(["Sponsor"]));
    assert!(contributors[0]["rorId"].is_null());
}

#[test]
fn test_contact_without_email_blocks_save_until_filled() {
    let raw = json!({"authors": [{"lastName": "Doe", "isContact": "true", "email": ""}]});
    let mut form = map_initial_resource(&raw, FormLimits::default());
    assert!(!form.is_submit_ready());

    let id = form.authors[0].id();
    if let Some(AuthorEntry::Person(p)) = form.author_mut(id) {
        p.email = "doe@example.org".to_string();
    }
    assert!(form.is_submit_ready());
}

#[test]
fn test_removal_renumbers_positions() {
    let mut form = ResourceForm::new(FormLimits::default());
    let first = form.add_contributor(EntryType::Person);
    let middle = form.add_contributor(EntryType::Institution);
    let last = form.add_contributor(EntryType::Person);
    form.remove_contributor(middle);

    let positions: Vec<usize> = form
        .to_payload()
        .contributors
        .iter()
        .map(|c| match c {
            ContributorPayload::Person(p) => p.position,
            ContributorPayload::Institution(i) => i.position,
        })
        .collect();
    assert_eq!(positions, vec![0, 1]);
    assert_eq!(form.contributors[0].id(), first);
    assert_eq!(form.contributors[1].id(), last);
}

#[test]
fn test_gate_on_mapped_form() {
    let raw = json!({"titles": [{"title": "One"}, {"title": "Two"}]});
    let mut form = map_initial_resource(&raw, FormLimits::default());
    assert!(form.add_title());
    assert!(!form.add_title());
    form.titles[2].title = "Three".to_string();
    assert!(!form.add_title());
    assert_eq!(form.titles.len(), 3);

    assert!(!form.add_license());
    form.licenses[0].license = "CC0-1.0".to_string();
    assert!(form.add_license());
}

#[test]
fn test_missing_year_and_resource_type_serialize_as_null() {
    let form = map_initial_resource(&json!({"year": "unknown"}), FormLimits::default());
    let payload = serde_json::to_value(form.to_payload()).unwrap();

    assert!(payload["year"].is_null());
    assert!(payload["resourceType"].is_null());
    assert!(payload.get("resourceId").is_none());
}
