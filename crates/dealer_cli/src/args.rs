//! Argument value types and parsers shared by subcommands.

use chrono::NaiveDate;
use clap::ValueEnum;
use dealer_core::{
    Coverage, FuelType, Gearbox, LineItem, PaymentMethod, Plan, VatRegime, VehicleStatus,
};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses `description;quantity;unit_price_ht;vat_rate[;discount_percent]`.
pub fn parse_line(value: &str) -> Result<LineItem, String> {
    let fields = value.split(';').map(str::trim).collect::<Vec<_>>();
    if !(4..=5).contains(&fields.len()) {
        return Err(format!(
            "expected `description;quantity;unit_price_ht;vat_rate[;discount]`, got `{value}`"
        ));
    }

    let decimal = |name: &str, raw: &str| {
        Decimal::from_str(raw).map_err(|err| format!("invalid {name} `{raw}`: {err}"))
    };
    let mut line = LineItem::new(
        fields[0],
        decimal("quantity", fields[1])?,
        decimal("unit price", fields[2])?,
        decimal("VAT rate", fields[3])?,
    );
    if let Some(discount) = fields.get(4) {
        line = line.with_discount(decimal("discount", discount)?);
    }
    line.validate().map_err(|err| err.to_string())?;
    Ok(line)
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlanArg {
    Free,
    Pro,
    Enterprise,
}

impl From<PlanArg> for Plan {
    fn from(value: PlanArg) -> Self {
        match value {
            PlanArg::Free => Plan::Free,
            PlanArg::Pro => Plan::Pro,
            PlanArg::Enterprise => Plan::Enterprise,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    InStock,
    Reserved,
    Sold,
}

impl From<StatusArg> for VehicleStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::InStock => VehicleStatus::InStock,
            StatusArg::Reserved => VehicleStatus::Reserved,
            StatusArg::Sold => VehicleStatus::Sold,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FuelArg {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
    Lpg,
    Other,
}

impl From<FuelArg> for FuelType {
    fn from(value: FuelArg) -> Self {
        match value {
            FuelArg::Petrol => FuelType::Petrol,
            FuelArg::Diesel => FuelType::Diesel,
            FuelArg::Hybrid => FuelType::Hybrid,
            FuelArg::Electric => FuelType::Electric,
            FuelArg::Lpg => FuelType::Lpg,
            FuelArg::Other => FuelType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GearboxArg {
    Manual,
    Automatic,
}

impl From<GearboxArg> for Gearbox {
    fn from(value: GearboxArg) -> Self {
        match value {
            GearboxArg::Manual => Gearbox::Manual,
            GearboxArg::Automatic => Gearbox::Automatic,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RegimeArg {
    Normal,
    Margin,
}

impl From<RegimeArg> for VatRegime {
    fn from(value: RegimeArg) -> Self {
        match value {
            RegimeArg::Normal => VatRegime::Normal,
            RegimeArg::Margin => VatRegime::Margin,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PaymentArg {
    Cash,
    Card,
    BankTransfer,
    Cheque,
    Financing,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(value: PaymentArg) -> Self {
        match value {
            PaymentArg::Cash => PaymentMethod::Cash,
            PaymentArg::Card => PaymentMethod::Card,
            PaymentArg::BankTransfer => PaymentMethod::BankTransfer,
            PaymentArg::Cheque => PaymentMethod::Cheque,
            PaymentArg::Financing => PaymentMethod::Financing,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CoverageArg {
    Powertrain,
    Extended,
    Full,
}

impl From<CoverageArg> for Coverage {
    fn from(value: CoverageArg) -> Self {
        match value {
            CoverageArg::Powertrain => Coverage::Powertrain,
            CoverageArg::Extended => Coverage::Extended,
            CoverageArg::Full => Coverage::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_line;
    use rust_decimal::Decimal;

    #[test]
    fn parses_line_with_optional_discount() {
        let line = parse_line("Oil filter; 2; 12.50; 20").unwrap();
        assert_eq!(line.description, "Oil filter");
        assert_eq!(line.quantity, Decimal::new(2, 0));
        assert_eq!(line.unit_price_ht, Decimal::new(1250, 2));
        assert_eq!(line.discount_percent, Decimal::ZERO);

        let discounted = parse_line("Service;1;100;20;15").unwrap();
        assert_eq!(discounted.discount_percent, Decimal::new(15, 0));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line("Oil filter;2;12.50").is_err());
        assert!(parse_line("Oil filter;two;12.50;20").is_err());
        assert!(parse_line(";1;10;20").is_err());
        assert!(parse_line("Oil filter;1;10;120").is_err());
        assert!(parse_line("Fleet;1000000000000000;1000000000000000;20").is_err());
    }
}
