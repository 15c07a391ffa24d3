//! `dealer` command-line front end for the dealership back office.
//!
//! Every command prints its result as pretty JSON on stdout.

mod args;
mod commands;

use args::{
    parse_line, CoverageArg, FuelArg, GearboxArg, PaymentArg, PlanArg, RegimeArg, StatusArg,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dealer_core::{DocId, LineItem};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dealer")]
#[command(version)]
#[command(about = "Vehicle dealership back office: stock, clients, billing and workshop")]
#[command(long_about = r#"
Keeps a dealership's vehicle inventory, clients, invoices, proformas,
deposits, repair orders, workers and warranties in a local database.

Example usage:
  dealer init
  dealer client add --first-name Paul --last-name Martin
  dealer vehicle add Peugeot 208 2021 --sale-price 15900
  dealer invoice create --client <ID> --line "Oil change;1;89;20"
"#)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Account namespace the command acts on
    #[arg(long, global = true, default_value = "default")]
    user: String,

    /// Enable debug logging and echo warnings to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Company profile, billing settings and plan
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },
    Client {
        #[command(subcommand)]
        action: ClientCommand,
    },
    Vehicle {
        #[command(subcommand)]
        action: VehicleCommand,
    },
    Worker {
        #[command(subcommand)]
        action: WorkerCommand,
    },
    Invoice {
        #[command(subcommand)]
        action: InvoiceCommand,
    },
    Proforma {
        #[command(subcommand)]
        action: ProformaCommand,
    },
    /// Deposit invoices (acomptes)
    Deposit {
        #[command(subcommand)]
        action: DepositCommand,
    },
    /// Workshop repair orders
    Order {
        #[command(subcommand)]
        action: OrderCommand,
    },
    Warranty {
        #[command(subcommand)]
        action: WarrantyCommand,
    },
    /// HT/TTC calculator
    Price {
        #[command(subcommand)]
        action: PriceCommand,
    },
    /// Stock, revenue and workshop summary
    Dashboard {
        /// Reference day, defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum AccountCommand {
    Show,
    /// Update company details
    Set {
        #[arg(long)]
        company_name: Option<String>,
        #[arg(long)]
        siret: Option<String>,
        #[arg(long)]
        vat_number: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Update invoicing defaults
    Billing {
        #[arg(long)]
        vat_rate: Option<Decimal>,
        #[arg(long)]
        payment_terms_days: Option<u32>,
        #[arg(long)]
        invoice_prefix: Option<String>,
        #[arg(long)]
        proforma_prefix: Option<String>,
        #[arg(long)]
        deposit_prefix: Option<String>,
        #[arg(long)]
        order_prefix: Option<String>,
        #[arg(long)]
        labor_rate: Option<Decimal>,
        #[arg(long)]
        legal_notice: Option<String>,
        #[arg(long)]
        iban: Option<String>,
    },
    Plan {
        #[arg(value_enum)]
        plan: PlanArg,
    },
}

#[derive(Subcommand)]
enum ClientCommand {
    /// Add an individual (`--last-name`) or a company (`--company`)
    Add {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long, required_unless_present = "company")]
        last_name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        vat_number: Option<String>,
    },
    Show {
        id: DocId,
    },
    List {
        /// Case-insensitive filter on names, email and phone
        #[arg(long)]
        search: Option<String>,
    },
    Delete {
        id: DocId,
    },
}

#[derive(Subcommand)]
enum VehicleCommand {
    Add {
        make: String,
        model: String,
        year: u16,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        vin: Option<String>,
        #[arg(long)]
        registration: Option<String>,
        #[arg(long, default_value_t = 0)]
        mileage: u32,
        #[arg(long, value_enum)]
        fuel: Option<FuelArg>,
        #[arg(long, value_enum)]
        gearbox: Option<GearboxArg>,
        #[arg(long)]
        color: Option<String>,
        /// Purchase price HT
        #[arg(long)]
        purchase_price: Option<Decimal>,
        /// Sale price TTC
        #[arg(long)]
        sale_price: Option<Decimal>,
        #[arg(long)]
        vat_rate: Option<Decimal>,
        #[arg(long, value_enum)]
        regime: Option<RegimeArg>,
    },
    Show {
        id: DocId,
    },
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    Reserve {
        id: DocId,
        #[arg(long)]
        client: DocId,
    },
    /// Record a sale without invoicing it
    Sell {
        id: DocId,
        #[arg(long)]
        client: DocId,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Cancel a reservation or a sale
    Restock {
        id: DocId,
    },
    Delete {
        id: DocId,
    },
}

#[derive(Subcommand)]
enum WorkerCommand {
    Add {
        first_name: String,
        last_name: String,
        #[arg(long, default_value = "mechanic")]
        role: String,
        /// Hourly rate HT
        #[arg(long)]
        rate: Decimal,
        #[arg(long)]
        phone: Option<String>,
    },
    List {
        /// Only workers that can be assigned
        #[arg(long)]
        active: bool,
    },
    Deactivate {
        id: DocId,
    },
    Delete {
        id: DocId,
    },
}

/// Fields shared by invoice and proforma creation.
#[derive(clap::Args)]
struct BillingArgs {
    #[arg(long)]
    client: Option<DocId>,
    #[arg(long)]
    vehicle: Option<DocId>,
    /// Issue date, defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Due date for invoices, validity limit for proformas
    #[arg(long)]
    due: Option<NaiveDate>,
    /// `description;quantity;unit_price_ht;vat_rate[;discount]`, repeatable
    #[arg(long = "line", value_parser = parse_line, required = true)]
    lines: Vec<LineItem>,
    #[arg(long, default_value = "")]
    notes: String,
}

#[derive(Subcommand)]
enum InvoiceCommand {
    Create(BillingArgs),
    /// Invoice a stock vehicle and mark it sold
    SellVehicle {
        vehicle: DocId,
        #[arg(long)]
        client: DocId,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Extra lines billed with the vehicle
        #[arg(long = "line", value_parser = parse_line)]
        lines: Vec<LineItem>,
    },
    /// Show an invoice and its balance due
    Show {
        id: DocId,
    },
    List {
        #[arg(long)]
        client: Option<DocId>,
    },
    Issue {
        id: DocId,
    },
    Pay {
        id: DocId,
        #[arg(long, value_enum)]
        method: PaymentArg,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Cancel {
        id: DocId,
    },
    Delete {
        id: DocId,
    },
    /// Deduct a pending deposit from an unpaid invoice
    ApplyDeposit {
        id: DocId,
        #[arg(long)]
        deposit: DocId,
    },
}

#[derive(Subcommand)]
enum ProformaCommand {
    Create(BillingArgs),
    Show {
        id: DocId,
    },
    List,
    Accept {
        id: DocId,
    },
    Reject {
        id: DocId,
    },
    /// Turn the proforma into a draft invoice
    Convert {
        id: DocId,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum DepositCommand {
    Create {
        /// Amount TTC
        amount: Decimal,
        #[arg(long)]
        client: Option<DocId>,
        #[arg(long)]
        vehicle: Option<DocId>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        vat_rate: Option<Decimal>,
    },
    Show {
        id: DocId,
    },
    List,
}

#[derive(Subcommand)]
enum OrderCommand {
    Open {
        complaint: String,
        #[arg(long)]
        client: Option<DocId>,
        #[arg(long)]
        vehicle: Option<DocId>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        mileage: Option<u32>,
    },
    /// Show an order with its totals
    Show {
        id: DocId,
    },
    List {
        /// Only open and in-progress orders
        #[arg(long)]
        open: bool,
    },
    AddTask {
        id: DocId,
        description: String,
        hours: Decimal,
        #[arg(long)]
        worker: Option<DocId>,
        /// Hourly rate HT, defaults to the worker's or the account's rate
        #[arg(long)]
        rate: Option<Decimal>,
    },
    AddPart {
        id: DocId,
        /// `description;quantity;unit_price_ht;vat_rate[;discount]`
        #[arg(value_parser = parse_line)]
        line: LineItem,
    },
    Start {
        id: DocId,
    },
    Complete {
        id: DocId,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Bill a completed order
    Invoice {
        id: DocId,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Delete {
        id: DocId,
    },
}

#[derive(Subcommand)]
enum WarrantyCommand {
    Add {
        vehicle: DocId,
        #[arg(long)]
        months: u32,
        #[arg(long, value_enum)]
        coverage: CoverageArg,
        #[arg(long)]
        client: Option<DocId>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        max_mileage: Option<u32>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        provider: Option<String>,
    },
    List {
        #[arg(long)]
        vehicle: Option<DocId>,
    },
    /// Active warranties ending within the window
    Expiring {
        /// Defaults to the dashboard window from the config
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    Delete {
        id: DocId,
    },
}

#[derive(Subcommand)]
enum PriceCommand {
    /// TTC from an HT amount
    Ttc {
        ht: Decimal,
        #[arg(long)]
        rate: Option<Decimal>,
    },
    /// HT from a TTC amount
    Ht {
        ttc: Decimal,
        #[arg(long)]
        rate: Option<Decimal>,
    },
    /// VAT due under the used-vehicle margin scheme
    Margin {
        sale_ttc: Decimal,
        purchase: Decimal,
        #[arg(long)]
        rate: Option<Decimal>,
    },
    /// Totals of a set of lines
    Lines {
        #[arg(long = "line", value_parser = parse_line, required = true)]
        lines: Vec<LineItem>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run(cli)
}
