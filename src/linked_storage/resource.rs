//! Lifecycle hooks for a linked storage account
//!
//! Create/update, read, delete and import against a `LinkedStorageAccountsClient`,
//! operating on a `ResourceData` state record. Every hook runs under its own
//! deadline from `ResourceTimeouts`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::client::LinkedStorageAccountsClient;
use super::ids::{DataSourceTypeId, WorkspaceId};
use super::models::{LinkedStorageAccountsResource, ResourceData, RESOURCE_TYPE};
use super::schema;
use crate::config::ResourceTimeouts;
use crate::error::{LalinkError, Result};

async fn with_timeout<T, F>(operation: &str, timeout: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| LalinkError::timeout(operation, timeout))?
}

/// The linked storage account resource, bound to a management-plane client
pub struct LinkedStorageAccountResource {
    client: Arc<dyn LinkedStorageAccountsClient>,
    timeouts: ResourceTimeouts,
}

impl LinkedStorageAccountResource {
    pub fn new(client: Arc<dyn LinkedStorageAccountsClient>, timeouts: ResourceTimeouts) -> Self {
        Self { client, timeouts }
    }

    /// Identifier a configuration maps to, after validation
    pub fn derive_id(data: &ResourceData) -> Result<DataSourceTypeId> {
        Ok(schema::validate(data)?.id())
    }

    /// Create the resource when `data` is new, otherwise replace its storage
    /// account set in place; then refresh `data` from the remote copy.
    pub async fn create_update(&self, data: &mut ResourceData) -> Result<()> {
        let is_new = data.is_new_resource();
        let (operation, timeout) = if is_new {
            ("create", self.timeouts.create())
        } else {
            ("update", self.timeouts.update())
        };

        let id = with_timeout(operation, timeout, self.create_update_inner(data, is_new)).await?;

        data.set_id(id.to_string());
        self.read(data).await
    }

    async fn create_update_inner(&self, data: &ResourceData, is_new: bool) -> Result<DataSourceTypeId> {
        let validated = schema::validate(data)?;
        let id = validated.id();

        if is_new {
            match self.client.get(&id).await {
                Ok(_) => return Err(LalinkError::already_exists(RESOURCE_TYPE, id.to_string())),
                Err(e) if e.is_not_found() => {
                    debug!("No existing {} found, creating", id);
                }
                Err(e) => {
                    return Err(LalinkError::remote_call(
                        "checking for presence of existing",
                        &id,
                        e,
                    ))
                }
            }
        }

        let parameters =
            LinkedStorageAccountsResource::for_storage_accounts(validated.storage_account_ids);
        self.client
            .create_or_update(&id, &parameters)
            .await
            .map_err(|e| LalinkError::remote_call("creating/updating", &id, e))?;

        if is_new {
            info!("Created {}", id);
        } else {
            info!("Updated {}", id);
        }

        Ok(id)
    }

    /// Refresh `data` from the remote resource. A missing remote resource
    /// clears `data.id` and is not an error.
    pub async fn read(&self, data: &mut ResourceData) -> Result<()> {
        with_timeout("read", self.timeouts.read(), self.read_inner(data)).await
    }

    async fn read_inner(&self, data: &mut ResourceData) -> Result<()> {
        let raw_id = data
            .id
            .clone()
            .ok_or_else(|| LalinkError::state("cannot read a resource that has no ID"))?;
        let id = DataSourceTypeId::parse_insensitively(&raw_id)?;

        let resource = match self.client.get(&id).await {
            Ok(resource) => resource,
            Err(e) if e.is_not_found() => {
                info!(
                    "Log Analytics Linked Storage Account {:?} does not exist - removing from state",
                    raw_id
                );
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(LalinkError::remote_call("retrieving", &id, e)),
        };

        data.resource_group_name = id.resource_group_name.clone();
        data.workspace_resource_id = WorkspaceId::new(
            id.subscription_id.clone(),
            id.resource_group_name.clone(),
            id.workspace_name.clone(),
        )
        .id();

        let props = resource.properties;
        data.storage_account_ids = props.storage_account_ids.unwrap_or_default().into_iter().collect();
        data.data_source_type = props.data_source_type.unwrap_or_default();

        Ok(())
    }

    /// Delete the remote resource. Errors, including not-found, are surfaced.
    pub async fn delete(&self, data: &ResourceData) -> Result<()> {
        with_timeout("delete", self.timeouts.delete(), async {
            let raw_id = data
                .id
                .as_deref()
                .ok_or_else(|| LalinkError::state("cannot delete a resource that has no ID"))?;
            let id = DataSourceTypeId::parse_insensitively(raw_id)?;

            self.client
                .delete(&id)
                .await
                .map_err(|e| LalinkError::remote_call("deleting", &id, e))?;

            info!("Deleted {}", id);
            Ok(())
        })
        .await
    }

    /// Validate an externally supplied id and return a state record bound to it.
    /// The caller is expected to `read` it afterwards to populate the fields.
    pub fn import(raw_id: &str) -> Result<ResourceData> {
        DataSourceTypeId::parse_insensitively(raw_id)?;
        Ok(ResourceData {
            id: Some(raw_id.to_string()),
            ..ResourceData::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linked_storage::client::MockLinkedStorageAccountsClient;
    use crate::linked_storage::models::{DataSourceType, LinkedStorageAccountsProperties};

    const WORKSPACE: &str =
        "/subscriptions/S/resourceGroups/G/providers/Microsoft.OperationalInsights/workspaces/W";
    const ACCOUNT_A: &str =
        "/subscriptions/S/resourceGroups/G/providers/Microsoft.Storage/storageAccounts/A";
    const ACCOUNT_B: &str =
        "/subscriptions/S/resourceGroups/G/providers/Microsoft.Storage/storageAccounts/B";

    fn id() -> DataSourceTypeId {
        DataSourceTypeId::new("S", "G", "W", DataSourceType::CustomLogs)
    }

    fn config() -> ResourceData {
        ResourceData::new("CustomLogs", "G", WORKSPACE, [ACCOUNT_A])
    }

    fn remote(accounts: &[&str]) -> LinkedStorageAccountsResource {
        LinkedStorageAccountsResource {
            id: Some(id().to_string()),
            name: Some("CustomLogs".to_string()),
            resource_type: Some("Microsoft.OperationalInsights/workspaces/linkedStorageAccounts".to_string()),
            properties: LinkedStorageAccountsProperties {
                data_source_type: Some("CustomLogs".to_string()),
                storage_account_ids: Some(accounts.iter().map(|s| s.to_string()).collect()),
            },
        }
    }

    fn resource(mock: MockLinkedStorageAccountsClient) -> LinkedStorageAccountResource {
        LinkedStorageAccountResource::new(Arc::new(mock), ResourceTimeouts::default())
    }

    #[tokio::test]
    async fn test_create_checks_presence_then_creates_then_reads() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| Err(LalinkError::not_found(id.to_string())));
        mock.expect_create_or_update()
            .withf(|id, params| {
                *id == DataSourceTypeId::new("S", "G", "W", DataSourceType::CustomLogs)
                    && params.properties.storage_account_ids == Some(vec![ACCOUNT_A.to_string()])
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(remote(&[ACCOUNT_A])));
        mock.expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(remote(&[ACCOUNT_A])));

        let mut data = config();
        resource(mock).create_update(&mut data).await.unwrap();

        assert_eq!(data.id.as_deref(), Some(format!("{WORKSPACE}/linkedStorageAccounts/CustomLogs").as_str()));
        assert_eq!(data, {
            let mut expected = config();
            expected.set_id(id().to_string());
            expected
        });
    }

    #[tokio::test]
    async fn test_create_refuses_to_adopt_existing_resource() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_get().times(1).returning(|_| Ok(remote(&[ACCOUNT_A])));
        mock.expect_create_or_update().never();

        let mut data = config();
        let err = resource(mock).create_update(&mut data).await.unwrap_err();

        assert!(matches!(err, LalinkError::AlreadyExists { .. }));
        assert!(data.is_new_resource());
    }

    #[tokio::test]
    async fn test_create_surfaces_presence_check_failures() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_get()
            .times(1)
            .returning(|_| Err(LalinkError::azure_api(403, "AuthorizationFailed")));
        mock.expect_create_or_update().never();

        let err = resource(mock).create_update(&mut config()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("checking for presence of existing /subscriptions/S/"));
        assert!(message.contains("AuthorizationFailed"));
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_remote_call() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_get().never();
        mock.expect_create_or_update().never();

        let mut data = config();
        data.storage_account_ids.clear();
        let err = resource(mock).create_update(&mut data).await.unwrap_err();
        assert!(matches!(err, LalinkError::Validation { ref field, .. } if field == "storage_account_ids"));
    }

    #[tokio::test]
    async fn test_update_skips_presence_check_and_replaces_the_set() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_create_or_update()
            .withf(|_, params| {
                params.properties.storage_account_ids
                    == Some(vec![ACCOUNT_A.to_string(), ACCOUNT_B.to_string()])
            })
            .times(1)
            .returning(|_, _| Ok(remote(&[ACCOUNT_B, ACCOUNT_A])));
        mock.expect_get()
            .times(1)
            .returning(|_| Ok(remote(&[ACCOUNT_B, ACCOUNT_A])));

        let mut data = config();
        data.set_id(id().to_string());
        data.storage_account_ids.insert(ACCOUNT_B.to_string());

        resource(mock).create_update(&mut data).await.unwrap();
        assert_eq!(data.storage_account_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_create_update_failure_is_wrapped() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_create_or_update()
            .returning(|_, _| Err(LalinkError::azure_api(400, "InvalidStorageAccount")));

        let mut data = config();
        data.set_id(id().to_string());
        let err = resource(mock).create_update(&mut data).await.unwrap_err();
        assert!(err.to_string().starts_with("creating/updating /subscriptions/S/"));
    }

    #[tokio::test]
    async fn test_read_of_missing_resource_clears_id() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_get()
            .times(1)
            .returning(|id| Err(LalinkError::not_found(id.to_string())));

        let mut data = config();
        data.set_id(id().to_string());
        resource(mock).read(&mut data).await.unwrap();
        assert!(data.is_new_resource());
    }

    #[tokio::test]
    async fn test_read_projects_remote_model() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_get().returning(|_| {
            Ok(LinkedStorageAccountsResource {
                properties: LinkedStorageAccountsProperties::default(),
                ..LinkedStorageAccountsResource::default()
            })
        });

        let mut data = ResourceData::new("Query", "stale", "/stale", [ACCOUNT_A]);
        data.set_id(
            format!("{WORKSPACE}/linkedStorageAccounts/CustomLogs").replace("resourceGroups", "resourcegroups"),
        );
        resource(mock).read(&mut data).await.unwrap();

        assert_eq!(data.resource_group_name, "G");
        assert_eq!(data.workspace_resource_id, WORKSPACE);
        assert!(data.storage_account_ids.is_empty());
        assert_eq!(data.data_source_type, "");
    }

    #[tokio::test]
    async fn test_read_surfaces_other_failures() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_get()
            .returning(|_| Err(LalinkError::azure_api(500, "InternalServerError")));

        let mut data = config();
        data.set_id(id().to_string());
        let err = resource(mock).read(&mut data).await.unwrap_err();
        assert!(err.to_string().starts_with("retrieving "));
        assert!(!data.is_new_resource());
    }

    #[tokio::test]
    async fn test_read_rejects_malformed_state_id() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_get().never();

        let mut data = config();
        data.set_id("/subscriptions/S/resourceGroups/G");
        let err = resource(mock).read(&mut data).await.unwrap_err();
        assert!(matches!(err, LalinkError::InvalidResourceId { .. }));
    }

    #[tokio::test]
    async fn test_delete_wraps_not_found() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_delete()
            .times(1)
            .returning(|id| Err(LalinkError::not_found(id.to_string())));

        let mut data = config();
        data.set_id(id().to_string());
        let err = resource(mock).delete(&data).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("deleting "));
    }

    #[tokio::test]
    async fn test_delete_success() {
        let mut mock = MockLinkedStorageAccountsClient::new();
        mock.expect_delete().withf(|target| *target == id()).times(1).returning(|_| Ok(()));
        mock.expect_get().never();

        let mut data = config();
        data.set_id(id().to_string());
        resource(mock).delete(&data).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_honours_deadline() {
        struct SlowClient;

        #[async_trait::async_trait]
        impl LinkedStorageAccountsClient for SlowClient {
            async fn get(&self, _id: &DataSourceTypeId) -> Result<LinkedStorageAccountsResource> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(LinkedStorageAccountsResource::default())
            }

            async fn create_or_update(
                &self,
                _id: &DataSourceTypeId,
                _parameters: &LinkedStorageAccountsResource,
            ) -> Result<LinkedStorageAccountsResource> {
                unreachable!()
            }

            async fn delete(&self, _id: &DataSourceTypeId) -> Result<()> {
                unreachable!()
            }
        }

        let timeouts = ResourceTimeouts {
            read: 1,
            ..ResourceTimeouts::default()
        };
        let resource = LinkedStorageAccountResource::new(Arc::new(SlowClient), timeouts);
        let mut data = config();
        data.set_id(id().to_string());

        let err = resource.read(&mut data).await.unwrap_err();
        assert!(matches!(err, LalinkError::Timeout { ref operation, .. } if operation == "read"));
    }

    #[test]
    fn test_import_validates_insensitively() {
        let raw = format!("{WORKSPACE}/linkedStorageAccounts/customlogs").to_lowercase();
        let data = LinkedStorageAccountResource::import(&raw).unwrap();
        assert_eq!(data.id.as_deref(), Some(raw.as_str()));

        assert!(LinkedStorageAccountResource::import("/subscriptions/S").is_err());
    }

    #[test]
    fn test_derive_id_is_deterministic() {
        let first = LinkedStorageAccountResource::derive_id(&config()).unwrap();
        let mut reordered = config();
        reordered.storage_account_ids.insert(ACCOUNT_B.to_string());
        let second = LinkedStorageAccountResource::derive_id(&reordered).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, id());
    }
}
