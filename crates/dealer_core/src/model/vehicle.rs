//! Vehicle inventory record.
//!
//! # Invariants
//! - `vin`, when set, is 17 characters from the VIN alphabet.
//! - `registration`, when set, uses the SIV or legacy FNI plate format.
//! - A `Sold` vehicle always names its buyer.

use super::{
    require_amount, require_non_empty, validate_rate, DocId, Document, ValidationError,
};
use crate::pricing::{default_vat_rate, ht_from_ttc, margin_vat};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static VIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("valid vin regex"));
static SIV_PLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}-?[0-9]{3}-?[A-Z]{2}$").expect("valid siv regex"));
static FNI_PLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{1,4} ?[A-Z]{1,3} ?(?:[0-9]{2}|2A|2B)$").expect("valid fni regex")
});

const MIN_YEAR: u16 = 1900;
const MAX_YEAR: u16 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    InStock,
    Reserved,
    Sold,
}

impl VehicleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
    Lpg,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gearbox {
    Manual,
    Automatic,
}

/// How VAT is charged when the vehicle is sold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatRegime {
    /// VAT on the full sale price.
    #[default]
    Normal,
    /// Used-vehicle margin scheme: VAT on the dealer margin only.
    Margin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: DocId,
    pub vin: Option<String>,
    pub registration: Option<String>,
    pub make: String,
    pub model: String,
    pub version: Option<String>,
    pub year: u16,
    pub first_registration: Option<NaiveDate>,
    pub mileage_km: u32,
    pub fuel: FuelType,
    pub gearbox: Gearbox,
    pub color: Option<String>,
    pub purchase_price_ht: Decimal,
    pub sale_price_ttc: Decimal,
    pub vat_rate: Decimal,
    #[serde(default)]
    pub vat_regime: VatRegime,
    pub status: VehicleStatus,
    /// Buyer once the vehicle is sold.
    pub client_id: Option<DocId>,
    pub sold_on: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl Vehicle {
    /// Creates an in-stock vehicle with a generated ID and default VAT rate.
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            vin: None,
            registration: None,
            make: make.into(),
            model: model.into(),
            version: None,
            year,
            first_registration: None,
            mileage_km: 0,
            fuel: FuelType::Petrol,
            gearbox: Gearbox::Manual,
            color: None,
            purchase_price_ht: Decimal::ZERO,
            sale_price_ttc: Decimal::ZERO,
            vat_rate: default_vat_rate(),
            vat_regime: VatRegime::Normal,
            status: VehicleStatus::InStock,
            client_id: None,
            sold_on: None,
            notes: String::new(),
        }
    }

    /// Short label used on billing lines.
    pub fn label(&self) -> String {
        let mut label = format!("{} {}", self.make, self.model);
        if let Some(version) = self.version.as_deref() {
            label.push(' ');
            label.push_str(version);
        }
        if let Some(registration) = self.registration.as_deref() {
            label.push_str(&format!(" ({registration})"));
        }
        label
    }

    /// Pre-tax sale price under the vehicle's VAT regime.
    ///
    /// Margin-scheme vehicles deduct only the VAT embedded in the margin.
    pub fn sale_price_ht(&self) -> Decimal {
        match self.vat_regime {
            VatRegime::Normal => ht_from_ttc(self.sale_price_ttc, self.vat_rate),
            VatRegime::Margin => self.sale_price_ttc - self.margin_vat(),
        }
    }

    /// VAT embedded in the margin; zero under the normal regime.
    pub fn margin_vat(&self) -> Decimal {
        match self.vat_regime {
            VatRegime::Normal => Decimal::ZERO,
            VatRegime::Margin => {
                margin_vat(self.sale_price_ttc, self.purchase_price_ht, self.vat_rate)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::InStock
    }
}

impl Document for Vehicle {
    const COLLECTION: &'static str = "vehicles";

    fn id(&self) -> DocId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("make", &self.make)?;
        require_non_empty("model", &self.model)?;
        if let Some(vin) = self.vin.as_deref() {
            if !VIN_RE.is_match(vin) {
                return Err(ValidationError::new(
                    "vin",
                    format!("`{vin}` is not a 17-character VIN"),
                ));
            }
        }
        if let Some(plate) = self.registration.as_deref() {
            if !SIV_PLATE_RE.is_match(plate) && !FNI_PLATE_RE.is_match(plate) {
                return Err(ValidationError::new(
                    "registration",
                    format!("`{plate}` is not a French registration"),
                ));
            }
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            return Err(ValidationError::new(
                "year",
                format!("must be between {MIN_YEAR} and {MAX_YEAR}"),
            ));
        }
        require_amount("purchase_price_ht", self.purchase_price_ht)?;
        require_amount("sale_price_ttc", self.sale_price_ttc)?;
        validate_rate("vat_rate", self.vat_rate)?;
        if self.status == VehicleStatus::Sold && self.client_id.is_none() {
            return Err(ValidationError::new("client_id", "a sold vehicle needs a buyer"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{VatRegime, Vehicle, VehicleStatus};
    use crate::model::Document;
    use rust_decimal::Decimal;

    #[test]
    fn accepts_siv_and_fni_registrations() {
        let mut vehicle = Vehicle::new("Renault", "Clio", 2019);
        for plate in ["AB-123-CD", "AB123CD", "1234 AB 56", "123 ABC 2A"] {
            vehicle.registration = Some(plate.to_string());
            assert!(vehicle.validate().is_ok(), "{plate} should be accepted");
        }
        vehicle.registration = Some("not a plate".to_string());
        assert_eq!(vehicle.validate().unwrap_err().field, "registration");
    }

    #[test]
    fn rejects_vin_with_forbidden_letters() {
        let mut vehicle = Vehicle::new("Peugeot", "308", 2021);
        vehicle.vin = Some("VF3LBHNZ6JS123456".to_string());
        assert!(vehicle.validate().is_ok());
        vehicle.vin = Some("VF3LBHNZ6JS12345O".to_string());
        assert_eq!(vehicle.validate().unwrap_err().field, "vin");
    }

    #[test]
    fn sold_vehicle_requires_buyer() {
        let mut vehicle = Vehicle::new("Dacia", "Sandero", 2020);
        vehicle.status = VehicleStatus::Sold;
        assert_eq!(vehicle.validate().unwrap_err().field, "client_id");
    }

    #[test]
    fn sale_price_ht_follows_vat_regime() {
        let mut vehicle = Vehicle::new("Citroen", "C3", 2018);
        vehicle.purchase_price_ht = Decimal::new(10_000, 0);
        vehicle.sale_price_ttc = Decimal::new(12_000, 0);
        assert_eq!(vehicle.sale_price_ht(), Decimal::new(10_000, 0));
        assert_eq!(vehicle.margin_vat(), Decimal::ZERO);

        vehicle.vat_regime = VatRegime::Margin;
        assert_eq!(vehicle.margin_vat(), Decimal::new(33_333, 2));
        assert_eq!(vehicle.sale_price_ht(), Decimal::new(1_166_667, 2));
    }
}
