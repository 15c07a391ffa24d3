use dealer_core::db::open_db_in_memory;
use dealer_core::store::DocumentStore;
use dealer_core::{
    AccountService, BillingSettings, Plan, ServiceError, SqliteDocumentStore, UserId, UserProfile,
};
use rust_decimal::Decimal;
use serde_json::json;

fn user(name: &str) -> UserId {
    UserId::parse(name).unwrap()
}

#[test]
fn fresh_account_reads_default_profile() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);

    let profile = AccountService::new(&store, user("garage-1"))
        .get_profile()
        .unwrap();
    assert_eq!(profile, UserProfile::default());
    assert_eq!(profile.plan, Plan::Free);
    assert_eq!(profile.billing.invoice_prefix, "FA");
    assert_eq!(profile.billing.default_vat_rate, Decimal::new(20, 0));
}

#[test]
fn profile_round_trips_and_is_scoped_per_user() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = AccountService::new(&store, user("garage-1"));

    let profile = UserProfile {
        company_name: "Garage du Centre".to_string(),
        siret: Some("12345678901234".to_string()),
        email: Some("contact@garage-centre.fr".to_string()),
        ..UserProfile::default()
    };
    service.save_profile(&profile).unwrap();

    assert_eq!(service.get_profile().unwrap(), profile);
    assert_eq!(
        AccountService::new(&store, user("garage-2"))
            .get_profile()
            .unwrap(),
        UserProfile::default()
    );
}

#[test]
fn invalid_profile_is_not_saved() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = AccountService::new(&store, user("garage-1"));

    let profile = UserProfile {
        siret: Some("123".to_string()),
        ..UserProfile::default()
    };
    match service.save_profile(&profile).unwrap_err() {
        ServiceError::Validation(err) => assert_eq!(err.field, "siret"),
        other => panic!("unexpected error: {other}"),
    }

    let bad_prefix = BillingSettings {
        invoice_prefix: "FA/".to_string(),
        ..BillingSettings::default()
    };
    assert!(matches!(
        service.update_billing_settings(bad_prefix),
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(service.get_profile().unwrap(), UserProfile::default());
}

#[test]
fn billing_update_and_plan_change_keep_the_rest() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = AccountService::new(&store, user("garage-1"));
    service
        .save_profile(&UserProfile {
            company_name: "Garage du Centre".to_string(),
            ..UserProfile::default()
        })
        .unwrap();

    service
        .update_billing_settings(BillingSettings {
            default_vat_rate: Decimal::new(55, 1),
            iban: Some("FR7630006000011234567890189".to_string()),
            ..BillingSettings::default()
        })
        .unwrap();
    let profile = service.change_plan(Plan::Enterprise).unwrap();

    assert_eq!(profile.company_name, "Garage du Centre");
    assert_eq!(profile.plan, Plan::Enterprise);
    assert_eq!(profile.billing.default_vat_rate, Decimal::new(55, 1));
    assert_eq!(service.get_profile().unwrap(), profile);
}

#[test]
fn partial_stored_profile_fills_billing_defaults() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let owner = user("garage-1");
    store
        .set(
            &owner,
            "account",
            "profile",
            &json!({
                "company_name": "Legacy Motors",
                "siret": null,
                "vat_number": null,
                "email": null,
                "phone": null,
                "address": null,
                "billing": { "invoice_prefix": "INV" }
            }),
        )
        .unwrap();

    let profile = AccountService::new(&store, owner).get_profile().unwrap();
    assert_eq!(profile.company_name, "Legacy Motors");
    assert_eq!(profile.plan, Plan::Free);
    assert_eq!(profile.billing.invoice_prefix, "INV");
    assert_eq!(profile.billing.proforma_prefix, "PF");
}
