use chrono::NaiveDate;
use dealer_core::db::open_db_in_memory;
use dealer_core::{
    AccountService, BillingSettings, Client, ClientService, LineItem, OrderDraft, OrderService,
    OrderStatus, ServiceError, SqliteDocumentStore, UserId, Vehicle, VehicleService, Worker,
    WorkerService,
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

fn draft(opened_on: NaiveDate) -> OrderDraft {
    OrderDraft {
        client_id: None,
        vehicle_id: None,
        opened_on,
        mileage_km: Some(84_000),
        complaint: "Squealing brakes".to_string(),
    }
}

#[test]
fn order_moves_from_open_to_invoiced() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let client = Client::individual("Paul", "Martin");
    ClientService::new(&store, user()).create(&client).unwrap();
    let vehicle = Vehicle::new("Renault", "Clio", 2016);
    VehicleService::new(&store, user()).create(&vehicle).unwrap();
    let mechanic = Worker::new("Zoe", "Durand", "mechanic", d("55"));
    WorkerService::new(&store, user()).create(&mechanic).unwrap();

    let service = OrderService::new(&store, user());
    let mut input = draft(date(2026, 4, 1));
    input.client_id = Some(client.id);
    input.vehicle_id = Some(vehicle.id);
    let order = service.open(&input).unwrap();
    assert_eq!(order.number, "OR-2026-0001");
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.labor_vat_rate, d("20"));

    let order = service
        .add_task(order.id, "Replace pads", d("1.5"), Some(mechanic.id), None)
        .unwrap();
    assert_eq!(order.tasks[0].hourly_rate_ht, d("55"));
    assert_eq!(order.tasks[0].worker_id, Some(mechanic.id));

    service
        .add_part(
            order.id,
            LineItem::new("Brake pads", d("1"), d("45"), d("20")),
        )
        .unwrap();
    assert_eq!(service.start(order.id).unwrap().status, OrderStatus::InProgress);
    assert!(matches!(
        service.invoice_order(order.id, date(2026, 4, 2)),
        Err(ServiceError::InvalidState(_))
    ));

    let completed = service.complete(order.id, date(2026, 4, 2)).unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.tasks.iter().all(|task| task.done));
    assert!(matches!(
        service.add_part(order.id, LineItem::new("Wipers", d("1"), d("20"), d("20"))),
        Err(ServiceError::InvalidState(_))
    ));

    let totals = service.totals(order.id).unwrap();
    assert_eq!(totals.total_ht, d("127.50"));
    assert_eq!(totals.total_ttc, d("153.00"));

    let invoice = service.invoice_order(order.id, date(2026, 4, 3)).unwrap();
    assert_eq!(invoice.number, "FA-2026-0001");
    assert_eq!(invoice.order_id, Some(order.id));
    assert_eq!(invoice.client_id, Some(client.id));
    assert_eq!(invoice.totals, totals);
    assert_eq!(invoice.lines[0].description, "Labor: Replace pads");
    assert_eq!(invoice.notes, "Repair order OR-2026-0001");

    let invoiced = service.get(order.id).unwrap().unwrap();
    assert_eq!(invoiced.status, OrderStatus::Invoiced);
    assert_eq!(invoiced.invoice_id, Some(invoice.id));
    assert!(matches!(
        service.invoice_order(order.id, date(2026, 4, 4)),
        Err(ServiceError::InvalidState(_))
    ));
    assert!(matches!(
        service.delete(order.id),
        Err(ServiceError::InvalidState(_))
    ));
}

#[test]
fn task_rate_falls_back_to_account_labor_rate() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    AccountService::new(&store, user())
        .update_billing_settings(BillingSettings {
            labor_rate_ht: d("72"),
            ..BillingSettings::default()
        })
        .unwrap();

    let service = OrderService::new(&store, user());
    let order = service.open(&draft(date(2026, 5, 1))).unwrap();

    let order = service
        .add_task(order.id, "Diagnosis", d("0.5"), None, None)
        .unwrap();
    assert_eq!(order.tasks[0].hourly_rate_ht, d("72"));

    let order = service
        .add_task(order.id, "Road test", d("0.25"), None, Some(d("40")))
        .unwrap();
    assert_eq!(order.tasks[1].hourly_rate_ht, d("40"));
    assert_eq!(order.labor_hours(), d("0.75"));
}

#[test]
fn inactive_worker_cannot_be_assigned() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let workers = WorkerService::new(&store, user());
    let worker = Worker::new("Luc", "Bernard", "body shop", d("50"));
    workers.create(&worker).unwrap();
    workers.deactivate(worker.id).unwrap();

    let service = OrderService::new(&store, user());
    let order = service.open(&draft(date(2026, 5, 1))).unwrap();
    assert!(matches!(
        service.add_task(order.id, "Dent repair", d("2"), Some(worker.id), None),
        Err(ServiceError::InvalidState(_))
    ));
    assert!(matches!(
        service.add_task(order.id, "Dent repair", d("-1"), None, None),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn zero_hour_task_is_kept_but_not_billed() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = OrderService::new(&store, user());

    let order = service.open(&draft(date(2026, 5, 4))).unwrap();
    let order = service
        .add_task(order.id, "Courtesy inspection", Decimal::ZERO, None, Some(d("60")))
        .unwrap();
    assert_eq!(order.tasks.len(), 1);
    service
        .add_part(
            order.id,
            LineItem::new("Wiper blades", d("1"), d("25"), d("20")),
        )
        .unwrap();
    service.complete(order.id, date(2026, 5, 4)).unwrap();

    let invoice = service.invoice_order(order.id, date(2026, 5, 5)).unwrap();
    assert_eq!(invoice.lines.len(), 1);
    assert_eq!(invoice.totals.total_ttc, d("30.00"));
}

#[test]
fn empty_order_cannot_be_invoiced() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = OrderService::new(&store, user());

    let order = service.open(&draft(date(2026, 6, 1))).unwrap();
    service.complete(order.id, date(2026, 6, 1)).unwrap();
    assert!(matches!(
        service.invoice_order(order.id, date(2026, 6, 2)),
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(
        service.get(order.id).unwrap().unwrap().status,
        OrderStatus::Completed
    );
}

#[test]
fn open_orders_exclude_completed_ones() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = OrderService::new(&store, user());

    let first = service.open(&draft(date(2026, 7, 1))).unwrap();
    let second = service.open(&draft(date(2026, 7, 2))).unwrap();
    assert_eq!(second.number, "OR-2026-0002");
    service.complete(first.id, date(2026, 7, 3)).unwrap();

    let open = service.list_open().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, second.id);
    assert_eq!(service.list().unwrap()[0].id, second.id);

    service.delete(first.id).unwrap();
    assert_eq!(service.list().unwrap().len(), 1);
}

#[test]
fn blank_complaint_does_not_consume_a_number() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let service = OrderService::new(&store, user());

    let mut blank = draft(date(2026, 8, 1));
    blank.complaint = "  ".to_string();
    assert!(matches!(
        service.open(&blank),
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(
        service.open(&draft(date(2026, 8, 1))).unwrap().number,
        "OR-2026-0001"
    );
}
