//! Account profile and billing settings of a dealership user.
//!
//! Stored as the single `profile` document of the `account` collection.

use super::{
    require_amount, require_non_empty, validate_optional_email, validate_rate, Address,
    ValidationError,
};
use crate::pricing::default_vat_rate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Subscription tier of the back-office account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    /// Inventory cap; `None` is unlimited.
    pub fn max_vehicles(self) -> Option<usize> {
        match self {
            Self::Free => Some(25),
            Self::Pro | Self::Enterprise => None,
        }
    }
}

/// Invoicing defaults and document-number prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    pub default_vat_rate: Decimal,
    pub payment_terms_days: u32,
    pub invoice_prefix: String,
    pub proforma_prefix: String,
    pub deposit_prefix: String,
    pub order_prefix: String,
    /// Workshop labor rate applied to new repair tasks.
    pub labor_rate_ht: Decimal,
    /// Legal footer printed on invoices.
    pub legal_notice: String,
    pub iban: Option<String>,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            default_vat_rate: default_vat_rate(),
            payment_terms_days: 30,
            invoice_prefix: "FA".to_string(),
            proforma_prefix: "PF".to_string(),
            deposit_prefix: "AC".to_string(),
            order_prefix: "OR".to_string(),
            labor_rate_ht: Decimal::new(60, 0),
            legal_notice: String::new(),
            iban: None,
        }
    }
}

impl BillingSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_rate("billing.default_vat_rate", self.default_vat_rate)?;
        require_amount("billing.labor_rate_ht", self.labor_rate_ht)?;
        for (field, prefix) in [
            ("billing.invoice_prefix", &self.invoice_prefix),
            ("billing.proforma_prefix", &self.proforma_prefix),
            ("billing.deposit_prefix", &self.deposit_prefix),
            ("billing.order_prefix", &self.order_prefix),
        ] {
            require_non_empty(field, prefix)?;
            if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ValidationError::new(field, "must be ASCII letters or digits"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub company_name: String,
    /// French company registration number.
    pub siret: Option<String>,
    pub vat_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub billing: BillingSettings,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(siret) = self.siret.as_deref() {
            if siret.len() != 14 || !siret.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError::new("siret", "must be 14 digits"));
            }
        }
        validate_optional_email("email", self.email.as_deref())?;
        self.billing.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{BillingSettings, Plan, UserProfile};

    #[test]
    fn default_profile_is_valid() {
        assert!(UserProfile::default().validate().is_ok());
        assert_eq!(Plan::default().max_vehicles(), Some(25));
    }

    #[test]
    fn rejects_malformed_siret_and_prefix() {
        let profile = UserProfile {
            siret: Some("1234".to_string()),
            ..UserProfile::default()
        };
        assert_eq!(profile.validate().unwrap_err().field, "siret");

        let billing = BillingSettings {
            invoice_prefix: "F/A".to_string(),
            ..BillingSettings::default()
        };
        assert_eq!(
            billing.validate().unwrap_err().field,
            "billing.invoice_prefix"
        );
    }

    #[test]
    fn partial_billing_json_falls_back_to_defaults() {
        let billing: BillingSettings =
            serde_json::from_str(r#"{"invoice_prefix":"INV"}"#).unwrap();
        assert_eq!(billing.invoice_prefix, "INV");
        assert_eq!(billing.payment_terms_days, 30);
    }
}
