//! API discovery documents.
//!
//! Mirrors the upstream's `APIGroupList` shape closely enough to decode it,
//! append one group and encode it again.

use serde::{Deserialize, Serialize};

use crate::rewrite::RewriteError;

/// Version advertised for the synthetic group.
pub const SYNTHETIC_VERSION: &str = "v1";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupVersionForDiscovery {
    #[serde(rename = "groupVersion")]
    pub group_version: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerAddressByClientCidr {
    #[serde(rename = "clientCIDR")]
    pub client_cidr: String,
    #[serde(rename = "serverAddress")]
    pub server_address: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGroup {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<GroupVersionForDiscovery>,
    #[serde(
        rename = "preferredVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_version: Option<GroupVersionForDiscovery>,
    #[serde(
        rename = "serverAddressByClientCIDRs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub server_address_by_client_cidrs: Vec<ServerAddressByClientCidr>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGroupList {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "apiVersion", default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default)]
    pub groups: Vec<ApiGroup>,
}

impl ApiGroup {
    /// Discovery entry for a group served only in `SYNTHETIC_VERSION`.
    pub fn synthetic(group: &str) -> Self {
        let version = GroupVersionForDiscovery {
            group_version: format!("{}/{}", group, SYNTHETIC_VERSION),
            version: SYNTHETIC_VERSION.to_string(),
        };
        Self {
            name: group.to_string(),
            versions: vec![version.clone()],
            preferred_version: Some(version),
            server_address_by_client_cidrs: Vec::new(),
        }
    }
}

/// Decode an `APIGroupList`, append `group` and encode the result.
pub fn add_synthetic_group(group: &str, input: &[u8]) -> Result<Vec<u8>, RewriteError> {
    let mut list: ApiGroupList = serde_json::from_slice(input).map_err(RewriteError::Decode)?;
    list.groups.push(ApiGroup::synthetic(group));
    serde_json::to_vec(&list).map_err(RewriteError::Encode)
}
