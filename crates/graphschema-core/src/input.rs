//! Caller-supplied desired state.
//!
//! These types carry names, never surrogate ids: the engine resolves every
//! reference by business identity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInput {
  pub name:         String,
  pub display_name: String,
  pub version:      String,
  #[serde(default)]
  pub namespace:    String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeKindInput {
  pub name:            String,
  #[serde(default)]
  pub display_name:    String,
  #[serde(default)]
  pub description:     String,
  #[serde(default)]
  pub is_display_kind: bool,
  #[serde(default)]
  pub icon:            String,
  #[serde(default)]
  pub icon_color:      String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeKindInput {
  pub name:           String,
  #[serde(default)]
  pub description:    String,
  #[serde(default)]
  pub is_traversable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInput {
  pub name:         String,
  #[serde(default)]
  pub display_name: String,
  #[serde(default)]
  pub data_type:    String,
  #[serde(default)]
  pub description:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInput {
  pub environment_kind_name: String,
  pub source_kind_name:      String,
  #[serde(default)]
  pub principal_kinds:       Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationInput {
  #[serde(default)]
  pub short_description: String,
  #[serde(default)]
  pub long_description:  String,
  #[serde(default)]
  pub short_remediation: String,
  #[serde(default)]
  pub long_remediation:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingInput {
  pub name:                   String,
  #[serde(default)]
  pub display_name:           String,
  pub environment_kind_name:  String,
  pub source_kind_name:       String,
  pub relationship_kind_name: String,
  #[serde(default)]
  pub remediation:            RemediationInput,
}

/// The complete desired state of one extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExtensionInput {
  pub extension:    ExtensionInput,
  #[serde(default)]
  pub node_kinds:   Vec<NodeKindInput>,
  #[serde(default)]
  pub edge_kinds:   Vec<EdgeKindInput>,
  #[serde(default)]
  pub properties:   Vec<PropertyInput>,
  #[serde(default)]
  pub environments: Vec<EnvironmentInput>,
  #[serde(default)]
  pub findings:     Vec<FindingInput>,
}
