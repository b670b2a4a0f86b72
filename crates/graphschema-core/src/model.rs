//! Persisted schema rows, as read back from a store.
//!
//! Every extension-owned row carries the `schema_extension_id` of the
//! extension that owns it. Ids are store-assigned surrogates and are never
//! reused after a row is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Extension ───────────────────────────────────────────────────────────────

/// A named, versioned bundle of schema definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaExtension {
  pub id:           i64,
  pub name:         String,
  pub display_name: String,
  pub version:      String,
  pub namespace:    String,
  /// Set only when the platform seeds the extension; never by an upsert.
  pub is_builtin:   bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  pub deleted_at:   Option<DateTime<Utc>>,
}

// ─── Kinds and properties ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeKind {
  pub id:                  i64,
  pub schema_extension_id: i64,
  pub name:                String,
  pub display_name:        String,
  pub description:         String,
  pub is_display_kind:     bool,
  pub icon:                String,
  pub icon_color:          String,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

/// A relationship kind declared by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeKind {
  pub id:                  i64,
  pub schema_extension_id: i64,
  pub name:                String,
  pub description:         String,
  pub is_traversable:      bool,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
  pub id:                  i64,
  pub schema_extension_id: i64,
  pub name:                String,
  pub display_name:        String,
  pub data_type:           String,
  pub description:         String,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

// ─── Platform kind identity ──────────────────────────────────────────────────

/// An entry in the platform-wide kind table. Node and edge kinds are mirrored
/// here on first registration; environment kinds must already be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kind {
  pub id:   i64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceKind {
  pub id:     i64,
  pub name:   String,
  pub active: bool,
}

// ─── Environments ────────────────────────────────────────────────────────────

/// The pairing of an environment kind with a source kind. No two environments
/// share the same pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
  pub id:                  i64,
  pub schema_extension_id: i64,
  pub environment_kind_id: i64,
  pub source_kind_id:      i64,
  pub created_at:          DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalKind {
  pub environment_id: i64,
  pub principal_kind: i64,
}

// ─── Findings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipFinding {
  pub id:                   i64,
  pub schema_extension_id:  i64,
  pub relationship_kind_id: i64,
  pub environment_id:       i64,
  pub name:                 String,
  pub display_name:         String,
  pub created_at:           DateTime<Utc>,
}

/// Guidance text attached 1:1 to a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remediation {
  pub finding_id:        i64,
  pub short_description: String,
  pub long_description:  String,
  pub short_remediation: String,
  pub long_remediation:  String,
  pub updated_at:        DateTime<Utc>,
}

// ─── Read model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentView {
  pub environment:     Environment,
  pub principal_kinds: Vec<PrincipalKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingView {
  pub finding:     RelationshipFinding,
  pub remediation: Option<Remediation>,
}

/// An extension together with everything it owns. Never stored, always
/// assembled on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSchema {
  pub extension:    SchemaExtension,
  pub node_kinds:   Vec<NodeKind>,
  pub edge_kinds:   Vec<EdgeKind>,
  pub properties:   Vec<Property>,
  pub environments: Vec<EnvironmentView>,
  pub findings:     Vec<FindingView>,
}
