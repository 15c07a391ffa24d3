//! Command handlers: resolve settings, open the store, call one service.

use crate::args::today;
use crate::{
    AccountCommand, BillingArgs, Cli, ClientCommand, Commands, DepositCommand, InvoiceCommand,
    OrderCommand, PriceCommand, ProformaCommand, VehicleCommand, WarrantyCommand, WorkerCommand,
};
use anyhow::Context;
use dealer_core::model::{require_amount, validate_rate};
use dealer_core::pricing::{ht_from_ttc, margin_vat, round_cents, ttc_from_ht, Totals};
use dealer_core::{
    default_log_level, init_logging, load_config, open_db, write_config, AccountService,
    BillingDraft, Client, ClientService, DashboardService, DealerConfig, DepositDraft,
    InvoiceService, OrderDraft, OrderService, SqliteDocumentStore, UserId, Vehicle,
    VehicleService, Warranty, WarrantyService, Worker, WorkerService,
};
use log::info;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Settings resolved from flags and the config file.
struct Settings {
    config_path: PathBuf,
    config: DealerConfig,
    user: UserId,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = resolve_settings(&cli)?;
    start_logging(&settings, cli.verbose)?;

    match cli.command {
        Commands::Init { force } => run_init(&settings, force),
        Commands::Price { action } => run_price(action, &settings),
        command => run_with_store(command, &settings),
    }
}

fn run_with_store(command: Commands, settings: &Settings) -> anyhow::Result<()> {
    let started_at = Instant::now();
    let db_path = &settings.config.database.path;
    let conn =
        open_db(db_path).with_context(|| format!("cannot open database {}", db_path.display()))?;
    let store = SqliteDocumentStore::new(&conn);
    let user = settings.user.clone();

    match command {
        Commands::Account { action } => run_account(action, &store, user)?,
        Commands::Client { action } => run_client(action, &store, user)?,
        Commands::Vehicle { action } => run_vehicle(action, &store, user)?,
        Commands::Worker { action } => run_worker(action, &store, user)?,
        Commands::Invoice { action } => run_invoice(action, &store, user)?,
        Commands::Proforma { action } => run_proforma(action, &store, user)?,
        Commands::Deposit { action } => run_deposit(action, &store, user)?,
        Commands::Order { action } => run_order(action, &store, user)?,
        Commands::Warranty { action } => run_warranty(action, &store, user, settings)?,
        Commands::Dashboard { today: reference } => {
            let summary = DashboardService::new(&store, user)
                .with_warranty_window(settings.config.dashboard.warranty_window_days)
                .summary(reference.unwrap_or_else(today))?;
            emit(&summary)?;
        }
        Commands::Init { .. } | Commands::Price { .. } => {
            anyhow::bail!("command does not use the database")
        }
    }

    info!(
        "event=cli_command module=cli status=ok duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(())
}

fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(dealer_core::default_config_path);
    let cwd = std::env::current_dir().context("cannot read current directory")?;
    let base = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(|parent| cwd.join(parent))
        .unwrap_or_else(|| cwd.clone());

    let mut config = load_config(Some(&config_path))?.resolve_paths(&base);
    if let Some(db) = &cli.db {
        config.database.path = cwd.join(db);
    }

    Ok(Settings {
        config_path,
        config,
        user: UserId::parse(&cli.user)?,
    })
}

/// File logging runs when the config names a directory or `--verbose` is set.
fn start_logging(settings: &Settings, verbose: bool) -> anyhow::Result<()> {
    let dir = match (&settings.config.logging.dir, verbose) {
        (Some(dir), _) => dir.clone(),
        (None, true) => database_dir(&settings.config.database.path).join("logs"),
        (None, false) => return Ok(()),
    };
    let level = if verbose {
        "debug"
    } else {
        settings
            .config
            .logging
            .level
            .as_deref()
            .unwrap_or_else(|| default_log_level())
    };
    init_logging(level, &dir, verbose)?;
    Ok(())
}

fn database_dir(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_init(settings: &Settings, force: bool) -> anyhow::Result<()> {
    write_config(&settings.config_path, &settings.config, force)?;
    let conn = open_db(&settings.config.database.path)?;
    let store = SqliteDocumentStore::new(&conn);

    let account = AccountService::new(&store, settings.user.clone());
    let mut profile = account.get_profile()?;
    profile.billing.default_vat_rate = settings.config.invoicing.default_vat_rate;
    profile.billing.payment_terms_days = settings.config.invoicing.payment_terms_days;
    account.save_profile(&profile)?;

    emit(&json!({
        "config": settings.config_path,
        "database": settings.config.database.path,
        "user": settings.user.as_str(),
        "version": dealer_core::core_version(),
    }))
}

fn run_account(
    action: AccountCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
) -> anyhow::Result<()> {
    let service = AccountService::new(store, user);
    let profile = match action {
        AccountCommand::Show => service.get_profile()?,
        AccountCommand::Set {
            company_name,
            siret,
            vat_number,
            email,
            phone,
        } => {
            let mut profile = service.get_profile()?;
            if let Some(company_name) = company_name {
                profile.company_name = company_name;
            }
            profile.siret = siret.or(profile.siret);
            profile.vat_number = vat_number.or(profile.vat_number);
            profile.email = email.or(profile.email);
            profile.phone = phone.or(profile.phone);
            service.save_profile(&profile)?;
            profile
        }
        AccountCommand::Billing {
            vat_rate,
            payment_terms_days,
            invoice_prefix,
            proforma_prefix,
            deposit_prefix,
            order_prefix,
            labor_rate,
            legal_notice,
            iban,
        } => {
            let mut billing = service.get_profile()?.billing;
            billing.default_vat_rate = vat_rate.unwrap_or(billing.default_vat_rate);
            billing.payment_terms_days = payment_terms_days.unwrap_or(billing.payment_terms_days);
            billing.invoice_prefix = invoice_prefix.unwrap_or(billing.invoice_prefix);
            billing.proforma_prefix = proforma_prefix.unwrap_or(billing.proforma_prefix);
            billing.deposit_prefix = deposit_prefix.unwrap_or(billing.deposit_prefix);
            billing.order_prefix = order_prefix.unwrap_or(billing.order_prefix);
            billing.labor_rate_ht = labor_rate.unwrap_or(billing.labor_rate_ht);
            billing.legal_notice = legal_notice.unwrap_or(billing.legal_notice);
            billing.iban = iban.or(billing.iban);
            service.update_billing_settings(billing)?
        }
        AccountCommand::Plan { plan } => service.change_plan(plan.into())?,
    };
    emit(&profile)
}

fn run_client(
    action: ClientCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
) -> anyhow::Result<()> {
    let service = ClientService::new(store, user);
    match action {
        ClientCommand::Add {
            first_name,
            last_name,
            company,
            email,
            phone,
            vat_number,
        } => {
            let mut client = match company {
                Some(company) => Client::company(company),
                None => Client::individual(String::new(), String::new()),
            };
            client.first_name = first_name.unwrap_or_default();
            client.last_name = last_name.unwrap_or_default();
            client.email = email;
            client.phone = phone;
            client.vat_number = vat_number;
            service.create(&client)?;
            emit(&client)
        }
        ClientCommand::Show { id } => emit(&service.require(id)?),
        ClientCommand::List { search } => match search {
            Some(needle) => emit(&service.search(&needle)?),
            None => emit(&service.list()?),
        },
        ClientCommand::Delete { id } => {
            service.delete(id)?;
            emit(&json!({ "deleted": id }))
        }
    }
}

fn run_vehicle(
    action: VehicleCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
) -> anyhow::Result<()> {
    let service = VehicleService::new(store, user);
    match action {
        VehicleCommand::Add {
            make,
            model,
            year,
            version,
            vin,
            registration,
            mileage,
            fuel,
            gearbox,
            color,
            purchase_price,
            sale_price,
            vat_rate,
            regime,
        } => {
            let mut vehicle = Vehicle::new(make, model, year);
            vehicle.version = version;
            vehicle.vin = vin.map(|vin| vin.to_uppercase());
            vehicle.registration = registration.map(|plate| plate.to_uppercase());
            vehicle.mileage_km = mileage;
            if let Some(fuel) = fuel {
                vehicle.fuel = fuel.into();
            }
            if let Some(gearbox) = gearbox {
                vehicle.gearbox = gearbox.into();
            }
            vehicle.color = color;
            vehicle.purchase_price_ht = purchase_price.unwrap_or(vehicle.purchase_price_ht);
            vehicle.sale_price_ttc = sale_price.unwrap_or(vehicle.sale_price_ttc);
            vehicle.vat_rate = vat_rate.unwrap_or(vehicle.vat_rate);
            if let Some(regime) = regime {
                vehicle.vat_regime = regime.into();
            }
            service.create(&vehicle)?;
            emit(&vehicle)
        }
        VehicleCommand::Show { id } => {
            let vehicle = service.require(id)?;
            emit(&json!({
                "vehicle": vehicle,
                "sale_price_ht": vehicle.sale_price_ht(),
                "margin_vat": vehicle.margin_vat(),
            }))
        }
        VehicleCommand::List { status } => match status {
            Some(status) => emit(&service.list_by_status(status.into())?),
            None => emit(&service.list()?),
        },
        VehicleCommand::Reserve { id, client } => emit(&service.reserve(id, client)?),
        VehicleCommand::Sell { id, client, date } => {
            emit(&service.mark_sold(id, client, date.unwrap_or_else(today))?)
        }
        VehicleCommand::Restock { id } => emit(&service.return_to_stock(id)?),
        VehicleCommand::Delete { id } => {
            service.delete(id)?;
            emit(&json!({ "deleted": id }))
        }
    }
}

fn run_worker(
    action: WorkerCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
) -> anyhow::Result<()> {
    let service = WorkerService::new(store, user);
    match action {
        WorkerCommand::Add {
            first_name,
            last_name,
            role,
            rate,
            phone,
        } => {
            let mut worker = Worker::new(first_name, last_name, role, rate);
            worker.phone = phone;
            service.create(&worker)?;
            emit(&worker)
        }
        WorkerCommand::List { active } => {
            if active {
                emit(&service.list_active()?)
            } else {
                emit(&service.list()?)
            }
        }
        WorkerCommand::Deactivate { id } => emit(&service.deactivate(id)?),
        WorkerCommand::Delete { id } => {
            service.delete(id)?;
            emit(&json!({ "deleted": id }))
        }
    }
}

fn billing_draft(args: BillingArgs) -> BillingDraft {
    let mut draft = BillingDraft::new(args.date.unwrap_or_else(today), args.lines);
    draft.client_id = args.client;
    draft.vehicle_id = args.vehicle;
    draft.due_date = args.due;
    draft.notes = args.notes;
    draft
}

fn run_invoice(
    action: InvoiceCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
) -> anyhow::Result<()> {
    let service = InvoiceService::new(store, user);
    match action {
        InvoiceCommand::Create(args) => emit(&service.create_invoice(&billing_draft(args))?),
        InvoiceCommand::SellVehicle {
            vehicle,
            client,
            date,
            lines,
        } => emit(&service.invoice_vehicle_sale(
            vehicle,
            client,
            date.unwrap_or_else(today),
            lines,
        )?),
        InvoiceCommand::Show { id } => {
            let invoice = service.require(id)?;
            let balance = service.balance_due(id)?;
            emit(&json!({ "invoice": invoice, "balance_due": balance }))
        }
        InvoiceCommand::List { client } => match client {
            Some(client) => emit(&service.list_for_client(client)?),
            None => emit(&service.list()?),
        },
        InvoiceCommand::Issue { id } => emit(&service.issue(id)?),
        InvoiceCommand::Pay { id, method, date } => {
            emit(&service.mark_paid(id, method.into(), date.unwrap_or_else(today))?)
        }
        InvoiceCommand::Cancel { id } => emit(&service.cancel(id)?),
        InvoiceCommand::Delete { id } => {
            service.delete(id)?;
            emit(&json!({ "deleted": id }))
        }
        InvoiceCommand::ApplyDeposit { id, deposit } => {
            let invoice = service.apply_deposit(id, deposit)?;
            let balance = service.balance_due(id)?;
            emit(&json!({ "invoice": invoice, "balance_due": balance }))
        }
    }
}

fn run_proforma(
    action: ProformaCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
) -> anyhow::Result<()> {
    let service = InvoiceService::new(store, user);
    match action {
        ProformaCommand::Create(args) => emit(&service.create_proforma(&billing_draft(args))?),
        ProformaCommand::Show { id } => {
            let proforma = service
                .get_proforma(id)?
                .with_context(|| format!("proforma not found: {id}"))?;
            emit(&json!({
                "proforma": proforma,
                "expired": proforma.is_expired_on(today()),
            }))
        }
        ProformaCommand::List => emit(&service.list_proformas()?),
        ProformaCommand::Accept { id } => emit(&service.accept_proforma(id)?),
        ProformaCommand::Reject { id } => emit(&service.reject_proforma(id)?),
        ProformaCommand::Convert { id, date } => {
            emit(&service.convert_proforma(id, date.unwrap_or_else(today))?)
        }
    }
}

fn run_deposit(
    action: DepositCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
) -> anyhow::Result<()> {
    let service = InvoiceService::new(store, user);
    match action {
        DepositCommand::Create {
            amount,
            client,
            vehicle,
            date,
            vat_rate,
        } => emit(&service.create_deposit(&DepositDraft {
            client_id: client,
            vehicle_id: vehicle,
            issue_date: date.unwrap_or_else(today),
            amount_ttc: amount,
            vat_rate,
        })?),
        DepositCommand::Show { id } => emit(
            &service
                .get_deposit(id)?
                .with_context(|| format!("deposit not found: {id}"))?,
        ),
        DepositCommand::List => emit(&service.list_deposits()?),
    }
}

fn run_order(
    action: OrderCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
) -> anyhow::Result<()> {
    let service = OrderService::new(store, user);
    match action {
        OrderCommand::Open {
            complaint,
            client,
            vehicle,
            date,
            mileage,
        } => emit(&service.open(&OrderDraft {
            client_id: client,
            vehicle_id: vehicle,
            opened_on: date.unwrap_or_else(today),
            mileage_km: mileage,
            complaint,
        })?),
        OrderCommand::Show { id } => {
            let order = service
                .get(id)?
                .with_context(|| format!("order not found: {id}"))?;
            emit(&json!({
                "order": order,
                "labor_hours": order.labor_hours(),
                "totals": order.totals()?,
            }))
        }
        OrderCommand::List { open } => {
            if open {
                emit(&service.list_open()?)
            } else {
                emit(&service.list()?)
            }
        }
        OrderCommand::AddTask {
            id,
            description,
            hours,
            worker,
            rate,
        } => emit(&service.add_task(id, description, hours, worker, rate)?),
        OrderCommand::AddPart { id, line } => emit(&service.add_part(id, line)?),
        OrderCommand::Start { id } => emit(&service.start(id)?),
        OrderCommand::Complete { id, date } => {
            emit(&service.complete(id, date.unwrap_or_else(today))?)
        }
        OrderCommand::Invoice { id, date } => {
            emit(&service.invoice_order(id, date.unwrap_or_else(today))?)
        }
        OrderCommand::Delete { id } => {
            service.delete(id)?;
            emit(&json!({ "deleted": id }))
        }
    }
}

fn run_warranty(
    action: WarrantyCommand,
    store: &SqliteDocumentStore<'_>,
    user: UserId,
    settings: &Settings,
) -> anyhow::Result<()> {
    let service = WarrantyService::new(store, user);
    match action {
        WarrantyCommand::Add {
            vehicle,
            months,
            coverage,
            client,
            start,
            max_mileage,
            price,
            provider,
        } => {
            let mut warranty =
                Warranty::new(vehicle, start.unwrap_or_else(today), months, coverage.into());
            warranty.client_id = client;
            warranty.max_mileage_km = max_mileage;
            warranty.price_ttc = price.unwrap_or(warranty.price_ttc);
            if let Some(provider) = provider {
                warranty.provider = provider;
            }
            let warranty = service.create(&warranty)?;
            emit(&json!({ "warranty": warranty, "end_date": warranty.end_date() }))
        }
        WarrantyCommand::List { vehicle } => match vehicle {
            Some(vehicle) => emit(&service.list_for_vehicle(vehicle)?),
            None => emit(&service.list()?),
        },
        WarrantyCommand::Expiring { days, today: reference } => {
            let days = days.unwrap_or(settings.config.dashboard.warranty_window_days);
            emit(&service.expiring_within(days, reference.unwrap_or_else(today))?)
        }
        WarrantyCommand::Delete { id } => {
            service.delete(id)?;
            emit(&json!({ "deleted": id }))
        }
    }
}

/// Pure arithmetic, no database involved.
fn run_price(action: PriceCommand, settings: &Settings) -> anyhow::Result<()> {
    let default_rate = settings.config.invoicing.default_vat_rate;
    match action {
        PriceCommand::Ttc { ht, rate } => {
            let rate = rate.unwrap_or(default_rate);
            validate_rate("rate", rate)?;
            require_amount("ht", ht)?;
            let ht = round_cents(ht);
            let ttc = ttc_from_ht(ht, rate);
            emit(&json!({ "ht": ht, "vat_rate": rate, "vat": ttc - ht, "ttc": ttc }))
        }
        PriceCommand::Ht { ttc, rate } => {
            let rate = rate.unwrap_or(default_rate);
            validate_rate("rate", rate)?;
            require_amount("ttc", ttc)?;
            let ttc = round_cents(ttc);
            let ht = ht_from_ttc(ttc, rate);
            emit(&json!({ "ttc": ttc, "vat_rate": rate, "vat": ttc - ht, "ht": ht }))
        }
        PriceCommand::Margin {
            sale_ttc,
            purchase,
            rate,
        } => {
            let rate = rate.unwrap_or(default_rate);
            validate_rate("rate", rate)?;
            require_amount("sale_ttc", sale_ttc)?;
            require_amount("purchase", purchase)?;
            emit(&json!({
                "sale_ttc": sale_ttc,
                "purchase": purchase,
                "vat_rate": rate,
                "margin_vat": margin_vat(sale_ttc, purchase, rate),
            }))
        }
        PriceCommand::Lines { lines } => emit(&Totals::from_lines(&lines)?),
    }
}
