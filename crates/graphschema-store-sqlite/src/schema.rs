//! SQL schema for the graph schema SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Surrogate ids are `AUTOINCREMENT` so a deleted id is never handed out
/// again. Foreign keys carry no `ON DELETE` action: dependents are removed
/// explicitly, in order, before the rows they reference.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Platform-wide kind identity. Rows are only ever added.
CREATE TABLE IF NOT EXISTS kinds (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS source_kinds (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL UNIQUE,
    active  INTEGER NOT NULL DEFAULT 1
);

INSERT OR IGNORE INTO source_kinds (id, name, active) VALUES
    (1, 'Base',   1),
    (2, 'AZBase', 1);

CREATE TABLE IF NOT EXISTS schema_extensions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    version       TEXT NOT NULL,
    namespace     TEXT NOT NULL DEFAULT '',
    is_builtin    INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    deleted_at    TEXT
);

CREATE TABLE IF NOT EXISTS schema_node_kinds (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    schema_extension_id  INTEGER NOT NULL REFERENCES schema_extensions(id),
    name                 TEXT NOT NULL UNIQUE,
    display_name         TEXT NOT NULL DEFAULT '',
    description          TEXT NOT NULL DEFAULT '',
    is_display_kind      INTEGER NOT NULL DEFAULT 0,
    icon                 TEXT NOT NULL DEFAULT '',
    icon_color           TEXT NOT NULL DEFAULT '',
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_relationship_kinds (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    schema_extension_id  INTEGER NOT NULL REFERENCES schema_extensions(id),
    name                 TEXT NOT NULL UNIQUE,
    description          TEXT NOT NULL DEFAULT '',
    is_traversable       INTEGER NOT NULL DEFAULT 0,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

-- Property names are unique per extension, not platform-wide.
CREATE TABLE IF NOT EXISTS schema_properties (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    schema_extension_id  INTEGER NOT NULL REFERENCES schema_extensions(id),
    name                 TEXT NOT NULL,
    display_name         TEXT NOT NULL DEFAULT '',
    data_type            TEXT NOT NULL DEFAULT '',
    description          TEXT NOT NULL DEFAULT '',
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    UNIQUE (schema_extension_id, name)
);

CREATE TABLE IF NOT EXISTS schema_environments (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    schema_extension_id  INTEGER NOT NULL REFERENCES schema_extensions(id),
    environment_kind_id  INTEGER NOT NULL REFERENCES kinds(id),
    source_kind_id       INTEGER NOT NULL REFERENCES source_kinds(id),
    created_at           TEXT NOT NULL,
    UNIQUE (environment_kind_id, source_kind_id)
);

CREATE TABLE IF NOT EXISTS schema_environment_principal_kinds (
    environment_id  INTEGER NOT NULL REFERENCES schema_environments(id),
    principal_kind  INTEGER NOT NULL REFERENCES kinds(id),
    PRIMARY KEY (environment_id, principal_kind)
);

CREATE TABLE IF NOT EXISTS schema_relationship_findings (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    schema_extension_id   INTEGER NOT NULL REFERENCES schema_extensions(id),
    relationship_kind_id  INTEGER NOT NULL REFERENCES kinds(id),
    environment_id        INTEGER NOT NULL REFERENCES schema_environments(id),
    name                  TEXT NOT NULL UNIQUE,
    display_name          TEXT NOT NULL DEFAULT '',
    created_at            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_remediations (
    finding_id         INTEGER PRIMARY KEY REFERENCES schema_relationship_findings(id),
    short_description  TEXT NOT NULL DEFAULT '',
    long_description   TEXT NOT NULL DEFAULT '',
    short_remediation  TEXT NOT NULL DEFAULT '',
    long_remediation   TEXT NOT NULL DEFAULT '',
    updated_at         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS node_kinds_extension_idx    ON schema_node_kinds(schema_extension_id);
CREATE INDEX IF NOT EXISTS rel_kinds_extension_idx     ON schema_relationship_kinds(schema_extension_id);
CREATE INDEX IF NOT EXISTS environments_extension_idx  ON schema_environments(schema_extension_id);
CREATE INDEX IF NOT EXISTS findings_extension_idx      ON schema_relationship_findings(schema_extension_id);
CREATE INDEX IF NOT EXISTS findings_environment_idx    ON schema_relationship_findings(environment_id);

PRAGMA user_version = 1;
";
