//! Linked storage account data models
//!
//! This module defines the data source type enumeration, the ARM wire
//! models exchanged with the management plane, and the local state record
//! that the lifecycle hooks read from and write to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::error::{LalinkError, Result};

/// Resource type name used in conflict messages and log lines
pub const RESOURCE_TYPE: &str = "log_analytics_linked_storage_account";

/// Category of telemetry a linked storage account serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataSourceType {
    CustomLogs,
    AzureWatson,
    Query,
    Alerts,
    /// Dropped from the 2020-08-01 API enum but still honoured by the service
    Ingestion,
}

impl DataSourceType {
    pub const ALL: [DataSourceType; 5] = [
        DataSourceType::CustomLogs,
        DataSourceType::AzureWatson,
        DataSourceType::Query,
        DataSourceType::Alerts,
        DataSourceType::Ingestion,
    ];

    /// Canonical casing as used by the management API and in identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceType::CustomLogs => "CustomLogs",
            DataSourceType::AzureWatson => "AzureWatson",
            DataSourceType::Query => "Query",
            DataSourceType::Alerts => "Alerts",
            DataSourceType::Ingestion => "Ingestion",
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, DataSourceType::Ingestion)
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSourceType {
    type Err = LalinkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let expected: Vec<String> = Self::ALL
                    .iter()
                    .map(|v| v.as_str().to_lowercase())
                    .collect();
                LalinkError::validation(
                    "data_source_type",
                    format!("expected one of [{}], got {:?}", expected.join(", "), s),
                )
            })
    }
}

/// ARM representation of a linked storage account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedStorageAccountsResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub properties: LinkedStorageAccountsProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedStorageAccountsProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_account_ids: Option<Vec<String>>,
}

impl LinkedStorageAccountsResource {
    /// Request body for a create-or-update call; only the account list is writable
    pub fn for_storage_accounts<I, S>(storage_account_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: LinkedStorageAccountsProperties {
                data_source_type: None,
                storage_account_ids: Some(storage_account_ids.into_iter().map(Into::into).collect()),
            },
            ..Default::default()
        }
    }
}

/// Local state record for one managed linked storage account.
///
/// `id` is `None` until the resource has been created (or imported) and is
/// cleared again when a read finds that the remote resource is gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub data_source_type: String,
    pub resource_group_name: String,
    pub workspace_resource_id: String,
    #[serde(default)]
    pub storage_account_ids: BTreeSet<String>,
}

impl ResourceData {
    pub fn new<I, S>(
        data_source_type: impl Into<String>,
        resource_group_name: impl Into<String>,
        workspace_resource_id: impl Into<String>,
        storage_account_ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            data_source_type: data_source_type.into(),
            resource_group_name: resource_group_name.into(),
            workspace_resource_id: workspace_resource_id.into(),
            storage_account_ids: storage_account_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// True until the record has been bound to a remote identifier
    pub fn is_new_resource(&self) -> bool {
        self.id.is_none()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn to_row(&self, name: &str) -> LinkedStorageAccountRow {
        LinkedStorageAccountRow {
            name: name.to_string(),
            data_source_type: self.data_source_type.clone(),
            resource_group_name: self.resource_group_name.clone(),
            storage_account_count: self.storage_account_ids.len(),
            id: self.id.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Row shown by `state list` and `show`
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct LinkedStorageAccountRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Data Source")]
    pub data_source_type: String,
    #[tabled(rename = "Resource Group")]
    pub resource_group_name: String,
    #[tabled(rename = "Storage Accounts")]
    pub storage_account_count: usize,
    #[tabled(rename = "ID")]
    pub id: String,
}
