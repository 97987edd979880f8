//! Linked storage account management facade
//!
//! Drives the lifecycle hooks against the local state store: planning,
//! applying (including replacement), refreshing, destroying and importing.

use tracing::{debug, info};

use super::models::ResourceData;
use super::resource::LinkedStorageAccountResource;
use super::schema::{self, Plan};
use crate::config::StateStore;
use crate::error::{LalinkError, Result};

/// Outcome of an apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub plan: Plan,
    /// State after the apply; `None` when the resource vanished during the final read
    pub state: Option<ResourceData>,
}

/// High-level manager over one state file
pub struct LinkedStorageAccountManager {
    resource: LinkedStorageAccountResource,
    store: StateStore,
}

impl LinkedStorageAccountManager {
    pub fn new(resource: LinkedStorageAccountResource, store: StateStore) -> Self {
        Self { resource, store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// What `apply` would do for `desired` under `name`, judged against the
    /// stored record without contacting Azure. Validation runs first.
    pub fn plan(&self, name: &str, desired: &ResourceData) -> Result<Plan> {
        schema::validate(desired)?;
        Ok(schema::plan(self.store.get(name), desired))
    }

    /// Converge the remote resource tracked as `name` onto `desired`.
    ///
    /// A tracked prior is refreshed first, so a resource deleted out of band
    /// is forgotten and created again within the same apply.
    pub async fn apply(&mut self, name: &str, desired: ResourceData) -> Result<ApplyOutcome> {
        schema::validate(&desired)?;

        let prior = match self.store.get(name).cloned() {
            Some(mut prior) => {
                self.resource.read(&mut prior).await?;
                self.commit(name, prior).await?
            }
            None => None,
        };

        let plan = schema::plan(prior.as_ref(), &desired);
        debug!(resource = name, ?plan, "applying");

        let mut data = desired;
        match &plan {
            Plan::NoOp => {
                data = prior.ok_or_else(|| LalinkError::state("no prior state for no-op plan"))?;
            }
            Plan::Create => {
                data.clear_id();
                self.resource.create_update(&mut data).await?;
            }
            Plan::Update => {
                data.id = prior.and_then(|p| p.id);
                self.resource.create_update(&mut data).await?;
            }
            Plan::Replace { fields } => {
                if let Some(prior) = prior {
                    info!(resource = name, ?fields, "forcing replacement");
                    self.resource.delete(&prior).await?;
                    self.store.remove(name);
                    self.store.save().await?;
                }
                data.clear_id();
                self.resource.create_update(&mut data).await?;
            }
        }

        let state = self.commit(name, data).await?;
        Ok(ApplyOutcome { plan, state })
    }

    /// Refresh `name` from the remote copy. Returns `None` and forgets the
    /// resource when it no longer exists remotely.
    pub async fn refresh(&mut self, name: &str) -> Result<Option<ResourceData>> {
        let mut data = self.tracked(name)?.clone();
        self.resource.read(&mut data).await?;
        self.commit(name, data).await
    }

    /// Delete the remote resource and forget it locally
    pub async fn destroy(&mut self, name: &str) -> Result<()> {
        let data = self.tracked(name)?.clone();
        self.resource.delete(&data).await?;
        self.store.remove(name);
        self.store.save().await
    }

    /// Start tracking an existing remote resource under `name`
    pub async fn import(&mut self, name: &str, raw_id: &str) -> Result<ResourceData> {
        if self.store.get(name).is_some() {
            return Err(LalinkError::state(format!(
                "'{}' is already managed; destroy or remove it before importing",
                name
            )));
        }
        if let Some(existing) = self.store.find_by_id(raw_id) {
            return Err(LalinkError::state(format!(
                "{} is already managed as '{}'",
                raw_id, existing
            )));
        }

        let mut data = LinkedStorageAccountResource::import(raw_id)?;
        self.resource.read(&mut data).await?;
        if data.is_new_resource() {
            return Err(LalinkError::not_found(raw_id));
        }

        info!(resource = name, id = raw_id, "imported");
        self.commit(name, data.clone()).await?;
        Ok(data)
    }

    fn tracked(&self, name: &str) -> Result<&ResourceData> {
        self.store
            .get(name)
            .ok_or_else(|| LalinkError::state(format!("'{}' is not managed", name)))
    }

    async fn commit(&mut self, name: &str, data: ResourceData) -> Result<Option<ResourceData>> {
        let kept = (!data.is_new_resource()).then(|| data.clone());
        if kept.is_none() {
            info!(resource = name, "removing from state");
        }
        self.store.put(name, data);
        self.store.save().await?;
        Ok(kept)
    }
}
