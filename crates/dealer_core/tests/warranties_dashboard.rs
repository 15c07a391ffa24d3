use chrono::NaiveDate;
use dealer_core::db::open_db_in_memory;
use dealer_core::{
    BillingDraft, Client, ClientService, Coverage, DashboardService, InvoiceService, LineItem,
    OrderDraft, OrderService, PaymentMethod, ServiceError, SqliteDocumentStore, UserId, Vehicle,
    VehicleService, Warranty, WarrantyService,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn user() -> UserId {
    UserId::parse("garage-1").unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn d(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

#[test]
fn warranty_defaults_buyer_from_vehicle() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let client = Client::individual("Paul", "Martin");
    ClientService::new(&store, user()).create(&client).unwrap();
    let vehicles = VehicleService::new(&store, user());
    let vehicle = Vehicle::new("Peugeot", "208", 2021);
    vehicles.create(&vehicle).unwrap();
    vehicles
        .mark_sold(vehicle.id, client.id, date(2026, 1, 31))
        .unwrap();

    let service = WarrantyService::new(&store, user());
    let warranty = service
        .create(&Warranty::new(
            vehicle.id,
            date(2026, 1, 31),
            12,
            Coverage::Powertrain,
        ))
        .unwrap();
    assert_eq!(warranty.client_id, Some(client.id));
    assert_eq!(warranty.end_date(), date(2027, 1, 31));
    assert_eq!(service.list_for_vehicle(vehicle.id).unwrap().len(), 1);
}

#[test]
fn warranty_for_unknown_vehicle_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = WarrantyService::new(&store, user());

    let warranty = Warranty::new(uuid::Uuid::new_v4(), date(2026, 1, 1), 6, Coverage::Full);
    assert!(matches!(
        service.create(&warranty),
        Err(ServiceError::NotFound { collection: "vehicles", .. })
    ));
}

#[test]
fn expiring_warranties_stay_within_window() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let vehicle = Vehicle::new("Renault", "Kangoo", 2019);
    VehicleService::new(&store, user()).create(&vehicle).unwrap();
    let service = WarrantyService::new(&store, user());

    let soon = Warranty::new(vehicle.id, date(2025, 11, 1), 12, Coverage::Extended);
    let later = Warranty::new(vehicle.id, date(2026, 6, 1), 12, Coverage::Full);
    let expired = Warranty::new(vehicle.id, date(2024, 1, 1), 12, Coverage::Powertrain);
    for warranty in [&soon, &later, &expired] {
        service.create(warranty).unwrap();
    }

    let today = date(2026, 10, 17);
    let expiring = service.expiring_within(30, today).unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].id, soon.id);
    assert_eq!(expiring[0].days_remaining(today), 15);

    let listed = service.list().unwrap();
    assert_eq!(listed[0].id, expired.id);
    assert_eq!(listed[2].id, later.id);
}

#[test]
fn dashboard_aggregates_stock_revenue_and_workshop() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let client = Client::individual("Ana", "Lopez");
    ClientService::new(&store, user()).create(&client).unwrap();

    let vehicles = VehicleService::new(&store, user());
    let mut in_stock = Vehicle::new("Dacia", "Sandero", 2020);
    in_stock.purchase_price_ht = d("8000");
    let mut reserved = Vehicle::new("Toyota", "Yaris", 2022);
    reserved.purchase_price_ht = d("14000");
    let mut sold = Vehicle::new("Fiat", "500", 2019);
    sold.purchase_price_ht = d("7000");
    sold.sale_price_ttc = d("9600");
    for vehicle in [&in_stock, &reserved, &sold] {
        vehicles.create(vehicle).unwrap();
    }
    vehicles.reserve(reserved.id, client.id).unwrap();

    let invoices = InvoiceService::new(&store, user());
    let sale = invoices
        .invoice_vehicle_sale(sold.id, client.id, date(2026, 10, 2), Vec::new())
        .unwrap();
    invoices.issue(sale.id).unwrap();
    invoices
        .mark_paid(sale.id, PaymentMethod::Financing, date(2026, 10, 5))
        .unwrap();

    let earlier = invoices
        .create_invoice(&BillingDraft::new(
            date(2026, 3, 1),
            vec![LineItem::new("Bodywork", d("1"), d("500"), d("20"))],
        ))
        .unwrap();
    invoices.issue(earlier.id).unwrap();
    invoices
        .mark_paid(earlier.id, PaymentMethod::Cheque, date(2026, 3, 10))
        .unwrap();

    let pending = invoices
        .create_invoice(&BillingDraft::new(
            date(2026, 10, 10),
            vec![LineItem::new("Tyres", d("4"), d("75"), d("20"))],
        ))
        .unwrap();
    invoices.issue(pending.id).unwrap();
    invoices
        .create_invoice(&BillingDraft::new(
            date(2026, 10, 11),
            vec![LineItem::new("Draft only", d("1"), d("10"), d("20"))],
        ))
        .unwrap();

    OrderService::new(&store, user())
        .open(&OrderDraft {
            client_id: Some(client.id),
            vehicle_id: None,
            opened_on: date(2026, 10, 12),
            mileage_km: None,
            complaint: "Oil change".to_string(),
        })
        .unwrap();

    WarrantyService::new(&store, user())
        .create(&Warranty::new(sold.id, date(2025, 11, 1), 12, Coverage::Full))
        .unwrap();

    let summary = DashboardService::new(&store, user())
        .summary(date(2026, 10, 17))
        .unwrap();
    assert_eq!(summary.vehicles_in_stock, 1);
    assert_eq!(summary.vehicles_reserved, 1);
    assert_eq!(summary.vehicles_sold, 1);
    assert_eq!(summary.stock_value_ht, d("22000"));
    assert_eq!(summary.revenue_month_ttc, d("9600.00"));
    assert_eq!(summary.revenue_year_ttc, d("10200.00"));
    assert_eq!(summary.outstanding_ttc, d("360.00"));
    assert_eq!(summary.open_orders, 1);
    assert_eq!(summary.expiring_warranties, 1);

    let narrow = DashboardService::new(&store, user())
        .with_warranty_window(7)
        .summary(date(2026, 10, 17))
        .unwrap();
    assert_eq!(narrow.expiring_warranties, 0);
}

#[test]
fn empty_account_has_zero_dashboard() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);

    let summary = DashboardService::new(&store, user())
        .summary(date(2026, 10, 17))
        .unwrap();
    assert_eq!(summary, Default::default());
}
