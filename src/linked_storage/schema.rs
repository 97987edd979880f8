//! Input validation and change planning
//!
//! Every field is checked here before any remote call is made. The same
//! field table drives replacement planning: a change to a `force_new`
//! field cannot be applied in place.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::warn;

use super::ids::{DataSourceTypeId, ResourceId, WorkspaceId};
use super::models::{DataSourceType, ResourceData};
use crate::error::{LalinkError, Result};

const RESOURCE_GROUP_NAME_MAX_LENGTH: usize = 90;

static RESOURCE_GROUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-\w._()]+$").expect("resource group pattern is valid"));

/// Declarative description of one schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub force_new: bool,
}

pub const FIELDS: &[FieldSchema] = &[
    FieldSchema {
        name: "data_source_type",
        force_new: true,
    },
    FieldSchema {
        name: "resource_group_name",
        force_new: true,
    },
    FieldSchema {
        name: "workspace_resource_id",
        force_new: true,
    },
    FieldSchema {
        name: "storage_account_ids",
        force_new: false,
    },
];

/// Input that has passed the validation gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub data_source_type: DataSourceType,
    pub resource_group_name: String,
    pub workspace: WorkspaceId,
    pub storage_account_ids: BTreeSet<String>,
}

impl ValidatedConfig {
    /// The identifier this configuration maps to. The resource group comes
    /// from `resource_group_name`, not from the workspace id.
    pub fn id(&self) -> DataSourceTypeId {
        DataSourceTypeId::new(
            self.workspace.subscription_id.clone(),
            self.resource_group_name.clone(),
            self.workspace.workspace_name.clone(),
            self.data_source_type,
        )
    }
}

pub fn validate_data_source_type(value: &str) -> Result<DataSourceType> {
    let parsed: DataSourceType = value.parse()?;
    if parsed.is_legacy() {
        warn!(data_source_type = %parsed, "legacy data source type");
    }
    Ok(parsed)
}

pub fn validate_resource_group_name(value: &str) -> Result<()> {
    const FIELD: &str = "resource_group_name";

    if value.len() > RESOURCE_GROUP_NAME_MAX_LENGTH {
        return Err(LalinkError::validation(
            FIELD,
            format!("may not exceed {RESOURCE_GROUP_NAME_MAX_LENGTH} characters in length"),
        ));
    }

    if value.ends_with('.') {
        return Err(LalinkError::validation(FIELD, "may not end with a period"));
    }

    if !RESOURCE_GROUP_NAME.is_match(value) {
        return Err(LalinkError::validation(
            FIELD,
            "may only contain alphanumeric characters, dash, underscores, parentheses and periods",
        ));
    }

    Ok(())
}

pub fn validate_workspace_resource_id(value: &str) -> Result<WorkspaceId> {
    WorkspaceId::parse(value)
        .map_err(|e| LalinkError::validation("workspace_resource_id", e.to_string()))
}

pub fn validate_storage_account_ids(values: &BTreeSet<String>) -> Result<()> {
    const FIELD: &str = "storage_account_ids";

    if values.is_empty() {
        return Err(LalinkError::validation(
            FIELD,
            "attribute supports 1 item minimum, but config has 0 declared",
        ));
    }

    for value in values {
        ResourceId::parse(value).map_err(|e| {
            LalinkError::validation(FIELD, format!("Can not parse {value:?} as a resource id: {e}"))
        })?;
    }

    Ok(())
}

/// Run every field validator; the first failure aborts.
pub fn validate(data: &ResourceData) -> Result<ValidatedConfig> {
    let data_source_type = validate_data_source_type(&data.data_source_type)?;
    validate_resource_group_name(&data.resource_group_name)?;
    let workspace = validate_workspace_resource_id(&data.workspace_resource_id)?;
    validate_storage_account_ids(&data.storage_account_ids)?;

    Ok(ValidatedConfig {
        data_source_type,
        resource_group_name: data.resource_group_name.clone(),
        workspace,
        storage_account_ids: data.storage_account_ids.clone(),
    })
}

/// What applying a desired configuration over the prior state would do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Create,
    Update,
    Replace { fields: Vec<&'static str> },
    NoOp,
}

fn field_changed(field: &str, prior: &ResourceData, desired: &ResourceData) -> bool {
    match field {
        "data_source_type" => !prior
            .data_source_type
            .eq_ignore_ascii_case(&desired.data_source_type),
        "resource_group_name" => prior.resource_group_name != desired.resource_group_name,
        "workspace_resource_id" => !prior
            .workspace_resource_id
            .eq_ignore_ascii_case(&desired.workspace_resource_id),
        "storage_account_ids" => prior.storage_account_ids != desired.storage_account_ids,
        _ => false,
    }
}

/// Compare the desired configuration with the prior state, if any.
pub fn plan(prior: Option<&ResourceData>, desired: &ResourceData) -> Plan {
    let prior = match prior {
        Some(prior) if !prior.is_new_resource() => prior,
        _ => return Plan::Create,
    };

    let changed: Vec<&FieldSchema> = FIELDS
        .iter()
        .filter(|f| field_changed(f.name, prior, desired))
        .collect();

    let replaced: Vec<&'static str> = changed
        .iter()
        .filter(|f| f.force_new)
        .map(|f| f.name)
        .collect();

    if !replaced.is_empty() {
        Plan::Replace { fields: replaced }
    } else if !changed.is_empty() {
        Plan::Update
    } else {
        Plan::NoOp
    }
}
