//! Encoding and decoding helpers between domain rows and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and booleans as `0`/`1`
//! integers. Each `Raw*` struct holds one row exactly as read; converting it
//! into the domain type is where decoding can fail.

use chrono::{DateTime, Utc};
use graphschema_core::{
  Error, Result,
  model::{
    EdgeKind, Environment, Kind, NodeKind, PrincipalKind, Property,
    RelationshipFinding, Remediation, SchemaExtension, SourceKind,
  },
};
use rusqlite::Row;

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::store(format!("invalid timestamp {s:?}"), e))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Extensions ──────────────────────────────────────────────────────────────

pub const EXTENSION_COLUMNS: &str = "id, name, display_name, version, namespace, \
                                     is_builtin, created_at, updated_at, deleted_at";

pub struct RawExtension {
  pub id:           i64,
  pub name:         String,
  pub display_name: String,
  pub version:      String,
  pub namespace:    String,
  pub is_builtin:   bool,
  pub created_at:   String,
  pub updated_at:   String,
  pub deleted_at:   Option<String>,
}

impl RawExtension {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      name:         row.get(1)?,
      display_name: row.get(2)?,
      version:      row.get(3)?,
      namespace:    row.get(4)?,
      is_builtin:   row.get(5)?,
      created_at:   row.get(6)?,
      updated_at:   row.get(7)?,
      deleted_at:   row.get(8)?,
    })
  }

  pub fn into_extension(self) -> Result<SchemaExtension> {
    Ok(SchemaExtension {
      id:           self.id,
      name:         self.name,
      display_name: self.display_name,
      version:      self.version,
      namespace:    self.namespace,
      is_builtin:   self.is_builtin,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
      deleted_at:   decode_opt_dt(self.deleted_at)?,
    })
  }
}

// ─── Node kinds ──────────────────────────────────────────────────────────────

pub const NODE_KIND_COLUMNS: &str = "id, schema_extension_id, name, display_name, \
                                     description, is_display_kind, icon, icon_color, \
                                     created_at, updated_at";

pub struct RawNodeKind {
  pub id:                  i64,
  pub schema_extension_id: i64,
  pub name:                String,
  pub display_name:        String,
  pub description:         String,
  pub is_display_kind:     bool,
  pub icon:                String,
  pub icon_color:          String,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawNodeKind {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      schema_extension_id: row.get(1)?,
      name:                row.get(2)?,
      display_name:        row.get(3)?,
      description:         row.get(4)?,
      is_display_kind:     row.get(5)?,
      icon:                row.get(6)?,
      icon_color:          row.get(7)?,
      created_at:          row.get(8)?,
      updated_at:          row.get(9)?,
    })
  }

  pub fn into_node_kind(self) -> Result<NodeKind> {
    Ok(NodeKind {
      id:                  self.id,
      schema_extension_id: self.schema_extension_id,
      name:                self.name,
      display_name:        self.display_name,
      description:         self.description,
      is_display_kind:     self.is_display_kind,
      icon:                self.icon,
      icon_color:          self.icon_color,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Relationship kinds ──────────────────────────────────────────────────────

pub const EDGE_KIND_COLUMNS: &str = "id, schema_extension_id, name, description, \
                                     is_traversable, created_at, updated_at";

pub struct RawEdgeKind {
  pub id:                  i64,
  pub schema_extension_id: i64,
  pub name:                String,
  pub description:         String,
  pub is_traversable:      bool,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawEdgeKind {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      schema_extension_id: row.get(1)?,
      name:                row.get(2)?,
      description:         row.get(3)?,
      is_traversable:      row.get(4)?,
      created_at:          row.get(5)?,
      updated_at:          row.get(6)?,
    })
  }

  pub fn into_edge_kind(self) -> Result<EdgeKind> {
    Ok(EdgeKind {
      id:                  self.id,
      schema_extension_id: self.schema_extension_id,
      name:                self.name,
      description:         self.description,
      is_traversable:      self.is_traversable,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Properties ──────────────────────────────────────────────────────────────

pub const PROPERTY_COLUMNS: &str = "id, schema_extension_id, name, display_name, \
                                    data_type, description, created_at, updated_at";

pub struct RawProperty {
  pub id:                  i64,
  pub schema_extension_id: i64,
  pub name:                String,
  pub display_name:        String,
  pub data_type:           String,
  pub description:         String,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawProperty {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      schema_extension_id: row.get(1)?,
      name:                row.get(2)?,
      display_name:        row.get(3)?,
      data_type:           row.get(4)?,
      description:         row.get(5)?,
      created_at:          row.get(6)?,
      updated_at:          row.get(7)?,
    })
  }

  pub fn into_property(self) -> Result<Property> {
    Ok(Property {
      id:                  self.id,
      schema_extension_id: self.schema_extension_id,
      name:                self.name,
      display_name:        self.display_name,
      data_type:           self.data_type,
      description:         self.description,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Environments ────────────────────────────────────────────────────────────

pub const ENVIRONMENT_COLUMNS: &str =
  "id, schema_extension_id, environment_kind_id, source_kind_id, created_at";

pub struct RawEnvironment {
  pub id:                  i64,
  pub schema_extension_id: i64,
  pub environment_kind_id: i64,
  pub source_kind_id:      i64,
  pub created_at:          String,
}

impl RawEnvironment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      schema_extension_id: row.get(1)?,
      environment_kind_id: row.get(2)?,
      source_kind_id:      row.get(3)?,
      created_at:          row.get(4)?,
    })
  }

  pub fn into_environment(self) -> Result<Environment> {
    Ok(Environment {
      id:                  self.id,
      schema_extension_id: self.schema_extension_id,
      environment_kind_id: self.environment_kind_id,
      source_kind_id:      self.source_kind_id,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub fn principal_kind_from_row(row: &Row<'_>) -> rusqlite::Result<PrincipalKind> {
  Ok(PrincipalKind {
    environment_id: row.get(0)?,
    principal_kind: row.get(1)?,
  })
}

// ─── Findings ────────────────────────────────────────────────────────────────

pub const FINDING_COLUMNS: &str = "id, schema_extension_id, relationship_kind_id, \
                                   environment_id, name, display_name, created_at";

pub struct RawFinding {
  pub id:                   i64,
  pub schema_extension_id:  i64,
  pub relationship_kind_id: i64,
  pub environment_id:       i64,
  pub name:                 String,
  pub display_name:         String,
  pub created_at:           String,
}

impl RawFinding {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      schema_extension_id:  row.get(1)?,
      relationship_kind_id: row.get(2)?,
      environment_id:       row.get(3)?,
      name:                 row.get(4)?,
      display_name:         row.get(5)?,
      created_at:           row.get(6)?,
    })
  }

  pub fn into_finding(self) -> Result<RelationshipFinding> {
    Ok(RelationshipFinding {
      id:                   self.id,
      schema_extension_id:  self.schema_extension_id,
      relationship_kind_id: self.relationship_kind_id,
      environment_id:       self.environment_id,
      name:                 self.name,
      display_name:         self.display_name,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

pub const REMEDIATION_COLUMNS: &str = "finding_id, short_description, long_description, \
                                       short_remediation, long_remediation, updated_at";

pub struct RawRemediation {
  pub finding_id:        i64,
  pub short_description: String,
  pub long_description:  String,
  pub short_remediation: String,
  pub long_remediation:  String,
  pub updated_at:        String,
}

impl RawRemediation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      finding_id:        row.get(0)?,
      short_description: row.get(1)?,
      long_description:  row.get(2)?,
      short_remediation: row.get(3)?,
      long_remediation:  row.get(4)?,
      updated_at:        row.get(5)?,
    })
  }

  pub fn into_remediation(self) -> Result<Remediation> {
    Ok(Remediation {
      finding_id:        self.finding_id,
      short_description: self.short_description,
      long_description:  self.long_description,
      short_remediation: self.short_remediation,
      long_remediation:  self.long_remediation,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Kind tables ─────────────────────────────────────────────────────────────

pub fn kind_from_row(row: &Row<'_>) -> rusqlite::Result<Kind> {
  Ok(Kind { id: row.get(0)?, name: row.get(1)? })
}

pub fn source_kind_from_row(row: &Row<'_>) -> rusqlite::Result<SourceKind> {
  Ok(SourceKind {
    id:     row.get(0)?,
    name:   row.get(1)?,
    active: row.get(2)?,
  })
}
