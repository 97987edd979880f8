//! Azure Resource Manager identifiers
//!
//! Typed identifiers for Log Analytics workspaces and their linked storage
//! accounts, plus a generic ARM resource id parser used to validate the
//! storage account references.

use std::collections::HashMap;
use std::fmt;

use super::models::DataSourceType;
use crate::error::{LalinkError, Result};

pub const PROVIDER_NAMESPACE: &str = "Microsoft.OperationalInsights";

enum Segment {
    Static(&'static str),
    Value(&'static str),
}

const WORKSPACE_SEGMENTS: &[Segment] = &[
    Segment::Static("subscriptions"),
    Segment::Value("subscriptionId"),
    Segment::Static("resourceGroups"),
    Segment::Value("resourceGroupName"),
    Segment::Static("providers"),
    Segment::Static(PROVIDER_NAMESPACE),
    Segment::Static("workspaces"),
    Segment::Value("workspaceName"),
];

const DATA_SOURCE_TYPE_SEGMENTS: &[Segment] = &[
    Segment::Static("subscriptions"),
    Segment::Value("subscriptionId"),
    Segment::Static("resourceGroups"),
    Segment::Value("resourceGroupName"),
    Segment::Static("providers"),
    Segment::Static(PROVIDER_NAMESPACE),
    Segment::Static("workspaces"),
    Segment::Value("workspaceName"),
    Segment::Static("linkedStorageAccounts"),
    Segment::Value("dataSourceType"),
];

fn example_of(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match s {
            Segment::Static(v) => format!("/{v}"),
            Segment::Value(name) => format!("/{{{name}}}"),
        })
        .collect()
}

/// Walk `input` against `segments`, returning the user-specified values in order.
/// When `insensitive` is set, static segments match regardless of case.
fn match_segments(input: &str, segments: &[Segment], insensitive: bool) -> Result<Vec<String>> {
    let trimmed = input.trim_start_matches('/').trim_end_matches('/');
    let parts: Vec<&str> = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    };

    if parts.len() != segments.len() {
        return Err(LalinkError::invalid_resource_id(
            input,
            format!(
                "expected {} segments but got {} - the ID should be in the format {}",
                segments.len(),
                parts.len(),
                example_of(segments)
            ),
        ));
    }

    let mut values = Vec::new();
    for (position, (part, segment)) in parts.iter().zip(segments).enumerate() {
        match segment {
            Segment::Static(expected) => {
                let matches = if insensitive {
                    part.eq_ignore_ascii_case(expected)
                } else {
                    part == expected
                };
                if !matches {
                    return Err(LalinkError::invalid_resource_id(
                        input,
                        format!(
                            "expected the segment at position {position} to be {expected:?} but got {part:?}"
                        ),
                    ));
                }
            }
            Segment::Value(name) => {
                if part.is_empty() {
                    return Err(LalinkError::invalid_resource_id(
                        input,
                        format!("the segment {name:?} was empty"),
                    ));
                }
                values.push(part.to_string());
            }
        }
    }

    Ok(values)
}

/// Identifies a Log Analytics workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub workspace_name: String,
}

impl WorkspaceId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        workspace_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            workspace_name: workspace_name.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, false)
    }

    pub fn parse_insensitively(input: &str) -> Result<Self> {
        Self::parse_with(input, true)
    }

    fn parse_with(input: &str, insensitive: bool) -> Result<Self> {
        let mut values = match_segments(input, WORKSPACE_SEGMENTS, insensitive)?.into_iter();
        Ok(Self {
            subscription_id: values.next().unwrap_or_default(),
            resource_group_name: values.next().unwrap_or_default(),
            workspace_name: values.next().unwrap_or_default(),
        })
    }

    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/workspaces/{}",
            self.subscription_id, self.resource_group_name, PROVIDER_NAMESPACE, self.workspace_name
        )
    }
}

/// Identifies a linked storage account: a workspace plus the data source type it serves
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataSourceTypeId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub workspace_name: String,
    pub data_source_type: DataSourceType,
}

impl DataSourceTypeId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        workspace_name: impl Into<String>,
        data_source_type: DataSourceType,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            workspace_name: workspace_name.into(),
            data_source_type,
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, false)
    }

    /// Accepts ids whose static segments differ in case, as written by
    /// earlier releases.
    // TODO: drop once state files written before canonical casing have been migrated
    pub fn parse_insensitively(input: &str) -> Result<Self> {
        Self::parse_with(input, true)
    }

    fn parse_with(input: &str, insensitive: bool) -> Result<Self> {
        let mut values = match_segments(input, DATA_SOURCE_TYPE_SEGMENTS, insensitive)?.into_iter();
        let subscription_id = values.next().unwrap_or_default();
        let resource_group_name = values.next().unwrap_or_default();
        let workspace_name = values.next().unwrap_or_default();
        let raw_type = values.next().unwrap_or_default();
        let data_source_type = raw_type.parse::<DataSourceType>().map_err(|_| {
            LalinkError::invalid_resource_id(
                input,
                format!("{raw_type:?} is not a recognised data source type"),
            )
        })?;

        Ok(Self {
            subscription_id,
            resource_group_name,
            workspace_name,
            data_source_type,
        })
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        WorkspaceId::new(
            self.subscription_id.clone(),
            self.resource_group_name.clone(),
            self.workspace_name.clone(),
        )
    }

    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DataSourceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/linkedStorageAccounts/{}",
            self.workspace_id(),
            self.data_source_type
        )
    }
}

/// Loosely-structured ARM id, as accepted for arbitrary resource references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: Option<String>,
    pub provider: Option<String>,
    pub path: HashMap<String, String>,
}

impl ResourceId {
    pub fn parse(input: &str) -> Result<Self> {
        let url = url::Url::parse("https://management.azure.com")
            .and_then(|base| base.join(input))
            .map_err(|e| LalinkError::invalid_resource_id(input, format!("cannot parse as a URL path: {e}")))?;

        let path = url.path().trim_start_matches('/').trim_end_matches('/');
        let components: Vec<&str> = path.split('/').collect();

        if components.len() % 2 != 0 {
            return Err(LalinkError::invalid_resource_id(
                input,
                "the number of path segments is not divisible by 2",
            ));
        }

        let mut map = HashMap::new();
        let mut provider = None;
        for pair in components.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(LalinkError::invalid_resource_id(
                    input,
                    format!("Key/Value cannot be empty strings. Key: '{key}', Value: '{value}'"),
                ));
            }
            if key == "providers" {
                provider = Some(value.to_string());
            } else {
                map.insert(key.to_string(), value.to_string());
            }
        }

        let subscription_id = map
            .remove("subscriptions")
            .ok_or_else(|| LalinkError::invalid_resource_id(input, "no subscription ID found"))?;
        let resource_group = map
            .remove("resourceGroups")
            .or_else(|| map.remove("resourcegroups"));

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            path: map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKSPACE: &str =
        "/subscriptions/S/resourceGroups/G/providers/Microsoft.OperationalInsights/workspaces/W";

    #[test]
    fn test_workspace_id_round_trips() {
        let id = WorkspaceId::parse(WORKSPACE).unwrap();
        assert_eq!(id, WorkspaceId::new("S", "G", "W"));
        assert_eq!(id.id(), WORKSPACE);
    }

    #[test]
    fn test_workspace_id_strict_parse_rejects_wrong_casing() {
        let lowered = WORKSPACE.replace("resourceGroups", "resourcegroups");
        assert!(WorkspaceId::parse(&lowered).is_err());
        assert_eq!(
            WorkspaceId::parse_insensitively(&lowered).unwrap(),
            WorkspaceId::new("S", "G", "W")
        );
    }

    #[test]
    fn test_workspace_id_rejects_other_resource_types() {
        let err = WorkspaceId::parse(
            "/subscriptions/S/resourceGroups/G/providers/Microsoft.Storage/storageAccounts/A",
        )
        .unwrap_err();
        assert!(matches!(err, LalinkError::InvalidResourceId { .. }));
        assert!(WorkspaceId::parse("").is_err());
        assert!(WorkspaceId::parse(&format!("{WORKSPACE}/extra")).is_err());
    }

    #[test]
    fn test_data_source_type_id_shape() {
        let id = DataSourceTypeId::new("S", "G", "W", DataSourceType::CustomLogs);
        assert_eq!(id.id(), format!("{WORKSPACE}/linkedStorageAccounts/CustomLogs"));
        assert_eq!(DataSourceTypeId::parse(&id.id()).unwrap(), id);
    }

    #[test]
    fn test_data_source_type_segment_is_case_insensitive() {
        let id = DataSourceTypeId::parse(&format!("{WORKSPACE}/linkedStorageAccounts/customlogs")).unwrap();
        assert_eq!(id.data_source_type, DataSourceType::CustomLogs);
        assert!(id.id().ends_with("/linkedStorageAccounts/CustomLogs"));
    }

    #[test]
    fn test_insensitive_parse_accepts_lowercased_statics() {
        let raw = format!("{WORKSPACE}/linkedStorageAccounts/Query").to_lowercase();
        assert!(DataSourceTypeId::parse(&raw).is_err());
        let id = DataSourceTypeId::parse_insensitively(&raw).unwrap();
        assert_eq!(id.subscription_id, "s");
        assert_eq!(id.data_source_type, DataSourceType::Query);
    }

    #[test]
    fn test_unknown_data_source_type_segment_is_rejected() {
        let err = DataSourceTypeId::parse(&format!("{WORKSPACE}/linkedStorageAccounts/Metrics")).unwrap_err();
        assert!(err.to_string().contains("Metrics"));
    }

    #[test]
    fn test_generic_resource_id() {
        let id = ResourceId::parse(
            "/subscriptions/S/resourceGroups/G/providers/Microsoft.Storage/storageAccounts/A",
        )
        .unwrap();
        assert_eq!(id.subscription_id, "S");
        assert_eq!(id.resource_group.as_deref(), Some("G"));
        assert_eq!(id.provider.as_deref(), Some("Microsoft.Storage"));
        assert_eq!(id.path.get("storageAccounts").map(String::as_str), Some("A"));
    }

    #[test]
    fn test_generic_resource_id_rejects_malformed_input() {
        assert!(ResourceId::parse("not-an-id").is_err());
        assert!(ResourceId::parse("/resourceGroups/G").is_err());
        assert!(ResourceId::parse("/subscriptions/S/resourceGroups").is_err());
        assert!(ResourceId::parse("/subscriptions//resourceGroups/G").is_err());
    }
}
