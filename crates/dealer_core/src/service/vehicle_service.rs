//! Vehicle inventory use-cases.
//!
//! # Invariants
//! - Lifecycle: `in_stock -> reserved -> sold`; reserved or sold vehicles
//!   can be returned to stock.
//! - Selling requires an existing client, and the reservation holder when
//!   the vehicle is reserved.
//! - The account plan caps the number of unsold vehicles.

use super::account_service::load_profile;
use super::{ServiceError, ServiceResult};
use crate::model::client::Client;
use crate::model::vehicle::{Vehicle, VehicleStatus};
use crate::model::{DocId, UserId};
use crate::repo::document_repo::DocumentRepository;
use crate::store::DocumentStore;
use chrono::NaiveDate;
use log::info;

pub struct VehicleService<S> {
    store: S,
    vehicles: DocumentRepository<S, Vehicle>,
    clients: DocumentRepository<S, Client>,
}

impl<S: DocumentStore + Clone> VehicleService<S> {
    pub fn new(store: S, user: UserId) -> Self {
        Self {
            vehicles: DocumentRepository::new(store.clone(), user.clone()),
            clients: DocumentRepository::new(store.clone(), user),
            store,
        }
    }

    /// Adds a vehicle to the inventory, enforcing the plan's stock cap.
    pub fn create(&self, vehicle: &Vehicle) -> ServiceResult<DocId> {
        let profile = load_profile(&self.store, self.vehicles.user())?;
        if let Some(max) = profile.plan.max_vehicles() {
            let unsold = self
                .vehicles
                .list()?
                .iter()
                .filter(|stored| stored.status != VehicleStatus::Sold)
                .count();
            if unsold >= max {
                return Err(ServiceError::PlanLimit(format!(
                    "{:?} plan allows {max} vehicles in stock",
                    profile.plan
                )));
            }
        }
        let id = self.vehicles.create(vehicle)?;
        info!("event=vehicle_created module=vehicle status=ok vehicle_id={id}");
        Ok(id)
    }

    pub fn get(&self, id: DocId) -> ServiceResult<Option<Vehicle>> {
        Ok(self.vehicles.get(id)?)
    }

    pub fn require(&self, id: DocId) -> ServiceResult<Vehicle> {
        Ok(self.vehicles.require(id)?)
    }

    pub fn update(&self, vehicle: &Vehicle) -> ServiceResult<()> {
        Ok(self.vehicles.update(vehicle)?)
    }

    pub fn delete(&self, id: DocId) -> ServiceResult<()> {
        self.vehicles.delete(id)?;
        info!("event=vehicle_deleted module=vehicle status=ok vehicle_id={id}");
        Ok(())
    }

    pub fn list(&self) -> ServiceResult<Vec<Vehicle>> {
        Ok(self.vehicles.list()?)
    }

    pub fn list_by_status(&self, status: VehicleStatus) -> ServiceResult<Vec<Vehicle>> {
        Ok(self.vehicles.find_by("status", status.as_str())?)
    }

    /// Holds an in-stock vehicle for a client.
    pub fn reserve(&self, id: DocId, client_id: DocId) -> ServiceResult<Vehicle> {
        let mut vehicle = self.vehicles.require(id)?;
        if !vehicle.is_available() {
            return Err(ServiceError::invalid_state(format!(
                "vehicle {id} is {} and cannot be reserved",
                vehicle.status.as_str()
            )));
        }
        self.clients.require(client_id)?;
        vehicle.status = VehicleStatus::Reserved;
        vehicle.client_id = Some(client_id);
        self.vehicles.update(&vehicle)?;
        Ok(vehicle)
    }

    /// Records the sale of a vehicle to a client.
    ///
    /// A reserved vehicle can only be sold to the client holding it.
    pub fn mark_sold(&self, id: DocId, client_id: DocId, sold_on: NaiveDate) -> ServiceResult<Vehicle> {
        let mut vehicle = self.vehicles.require(id)?;
        ensure_sellable_to(&vehicle, client_id)?;
        self.clients.require(client_id)?;
        vehicle.status = VehicleStatus::Sold;
        vehicle.client_id = Some(client_id);
        vehicle.sold_on = Some(sold_on);
        self.vehicles.update(&vehicle)?;
        info!("event=vehicle_sold module=vehicle status=ok vehicle_id={id}");
        Ok(vehicle)
    }

    /// Cancels a reservation or a sale.
    pub fn return_to_stock(&self, id: DocId) -> ServiceResult<Vehicle> {
        let mut vehicle = self.vehicles.require(id)?;
        if vehicle.is_available() {
            return Err(ServiceError::invalid_state(format!(
                "vehicle {id} is already in stock"
            )));
        }
        vehicle.status = VehicleStatus::InStock;
        vehicle.client_id = None;
        vehicle.sold_on = None;
        self.vehicles.update(&vehicle)?;
        Ok(vehicle)
    }
}

/// Rejects sold vehicles and vehicles reserved for someone else.
pub(crate) fn ensure_sellable_to(vehicle: &Vehicle, client_id: DocId) -> ServiceResult<()> {
    match (vehicle.status, vehicle.client_id) {
        (VehicleStatus::Sold, _) => Err(ServiceError::invalid_state(format!(
            "vehicle {} is already sold",
            vehicle.id
        ))),
        (VehicleStatus::Reserved, Some(holder)) if holder != client_id => {
            Err(ServiceError::invalid_state(format!(
                "vehicle {} is reserved for another client",
                vehicle.id
            )))
        }
        _ => Ok(()),
    }
}
