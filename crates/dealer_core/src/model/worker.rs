//! Workshop staff record.

use super::{require_amount, require_non_empty, DocId, Document, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: DocId,
    pub first_name: String,
    pub last_name: String,
    /// Free-form role, e.g. "mechanic" or "body shop".
    pub role: String,
    pub phone: Option<String>,
    pub hourly_rate_ht: Decimal,
    pub active: bool,
}

impl Worker {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: impl Into<String>,
        hourly_rate_ht: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role: role.into(),
            phone: None,
            hourly_rate_ht,
            active: true,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Document for Worker {
    const COLLECTION: &'static str = "workers";

    fn id(&self) -> DocId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("first_name", &self.first_name)?;
        require_non_empty("last_name", &self.last_name)?;
        require_amount("hourly_rate_ht", self.hourly_rate_ht)
    }
}
