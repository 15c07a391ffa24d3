//! Workshop staff use-cases.

use super::ServiceResult;
use crate::model::worker::Worker;
use crate::model::{DocId, UserId};
use crate::repo::document_repo::DocumentRepository;
use crate::store::DocumentStore;
use serde_json::{Map, Value};

pub struct WorkerService<S> {
    workers: DocumentRepository<S, Worker>,
}

impl<S: DocumentStore> WorkerService<S> {
    pub fn new(store: S, user: UserId) -> Self {
        Self {
            workers: DocumentRepository::new(store, user),
        }
    }

    pub fn create(&self, worker: &Worker) -> ServiceResult<DocId> {
        Ok(self.workers.create(worker)?)
    }

    pub fn get(&self, id: DocId) -> ServiceResult<Option<Worker>> {
        Ok(self.workers.get(id)?)
    }

    pub fn update(&self, worker: &Worker) -> ServiceResult<()> {
        Ok(self.workers.update(worker)?)
    }

    pub fn delete(&self, id: DocId) -> ServiceResult<()> {
        Ok(self.workers.delete(id)?)
    }

    /// Workers sorted by last then first name.
    pub fn list(&self) -> ServiceResult<Vec<Worker>> {
        let mut workers = self.workers.list()?;
        workers.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str())
                .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(workers)
    }

    pub fn list_active(&self) -> ServiceResult<Vec<Worker>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|worker| worker.active)
            .collect())
    }

    /// Keeps the worker for history but hides it from assignment lists.
    pub fn deactivate(&self, id: DocId) -> ServiceResult<Worker> {
        let mut fields = Map::new();
        fields.insert("active".to_string(), Value::Bool(false));
        Ok(self.workers.patch(id, fields)?)
    }
}
