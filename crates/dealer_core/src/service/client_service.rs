//! Client use-cases.

use super::ServiceResult;
use crate::model::client::Client;
use crate::model::{DocId, UserId};
use crate::repo::document_repo::DocumentRepository;
use crate::store::DocumentStore;
use log::info;

/// Client CRUD service.
pub struct ClientService<S> {
    clients: DocumentRepository<S, Client>,
}

impl<S: DocumentStore> ClientService<S> {
    pub fn new(store: S, user: UserId) -> Self {
        Self {
            clients: DocumentRepository::new(store, user),
        }
    }

    pub fn create(&self, client: &Client) -> ServiceResult<DocId> {
        let id = self.clients.create(client)?;
        info!("event=client_created module=client status=ok client_id={id}");
        Ok(id)
    }

    pub fn get(&self, id: DocId) -> ServiceResult<Option<Client>> {
        Ok(self.clients.get(id)?)
    }

    pub fn require(&self, id: DocId) -> ServiceResult<Client> {
        Ok(self.clients.require(id)?)
    }

    pub fn update(&self, client: &Client) -> ServiceResult<()> {
        Ok(self.clients.update(client)?)
    }

    /// Deletes a client. Documents referencing it keep the dangling ID.
    pub fn delete(&self, id: DocId) -> ServiceResult<()> {
        self.clients.delete(id)?;
        info!("event=client_deleted module=client status=ok client_id={id}");
        Ok(())
    }

    /// Clients sorted by display name.
    pub fn list(&self) -> ServiceResult<Vec<Client>> {
        let mut clients = self.clients.list()?;
        clients.sort_by_key(|client| client.display_name().to_lowercase());
        Ok(clients)
    }

    /// Case-insensitive search on names, email and phone.
    pub fn search(&self, needle: &str) -> ServiceResult<Vec<Client>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|client| client.matches(needle))
            .collect())
    }
}
