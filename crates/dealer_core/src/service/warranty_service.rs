//! Warranty use-cases.

use super::ServiceResult;
use crate::model::vehicle::Vehicle;
use crate::model::warranty::Warranty;
use crate::model::{DocId, UserId};
use crate::repo::document_repo::DocumentRepository;
use crate::store::DocumentStore;
use chrono::NaiveDate;

pub struct WarrantyService<S> {
    warranties: DocumentRepository<S, Warranty>,
    vehicles: DocumentRepository<S, Vehicle>,
}

impl<S: DocumentStore + Clone> WarrantyService<S> {
    pub fn new(store: S, user: UserId) -> Self {
        Self {
            warranties: DocumentRepository::new(store.clone(), user.clone()),
            vehicles: DocumentRepository::new(store, user),
        }
    }

    /// Stores a warranty for an existing vehicle.
    ///
    /// The buyer defaults to the vehicle's client when not given.
    pub fn create(&self, warranty: &Warranty) -> ServiceResult<Warranty> {
        let vehicle = self.vehicles.require(warranty.vehicle_id)?;
        let mut warranty = warranty.clone();
        if warranty.client_id.is_none() {
            warranty.client_id = vehicle.client_id;
        }
        self.warranties.create(&warranty)?;
        Ok(warranty)
    }

    pub fn get(&self, id: DocId) -> ServiceResult<Option<Warranty>> {
        Ok(self.warranties.get(id)?)
    }

    pub fn update(&self, warranty: &Warranty) -> ServiceResult<()> {
        Ok(self.warranties.update(warranty)?)
    }

    pub fn delete(&self, id: DocId) -> ServiceResult<()> {
        Ok(self.warranties.delete(id)?)
    }

    /// Warranties sorted by end date, soonest first.
    pub fn list(&self) -> ServiceResult<Vec<Warranty>> {
        let mut warranties = self.warranties.list()?;
        warranties.sort_by_key(Warranty::end_date);
        Ok(warranties)
    }

    pub fn list_for_vehicle(&self, vehicle_id: DocId) -> ServiceResult<Vec<Warranty>> {
        let mut warranties = self
            .warranties
            .find_by("vehicle_id", vehicle_id.to_string())?;
        warranties.sort_by_key(Warranty::end_date);
        Ok(warranties)
    }

    /// Warranties active on `today` that end within `days` days.
    pub fn expiring_within(&self, days: u32, today: NaiveDate) -> ServiceResult<Vec<Warranty>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|warranty| {
                warranty.is_active_on(today) && warranty.days_remaining(today) <= i64::from(days)
            })
            .collect())
    }
}
