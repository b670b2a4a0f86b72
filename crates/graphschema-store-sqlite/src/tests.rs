//! Integration tests for `SqliteStore` against an in-memory database.

use graphschema_core::{
  Entity, Error as CoreError,
  engine::{self, extension::upsert_graph_extension_in},
  input::{
    EdgeKindInput, EnvironmentInput, ExtensionInput, FindingInput,
    GraphExtensionInput, NodeKindInput, PropertyInput, RemediationInput,
  },
  store::{
    EdgeKindRepository, EnvironmentRepository, FindingRepository, KindResolver,
    NodeKindRepository, PropertyRepository, SchemaStore, SchemaTransaction,
    SourceKindRegistry, UnitOfWork,
  },
};

use crate::{Error, SqliteStore, SqliteUnitOfWork};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn core(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected an engine error, got {other}"),
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn node(name: &str) -> NodeKindInput {
  NodeKindInput {
    name: name.into(),
    display_name: format!("{name} display"),
    is_display_kind: true,
    ..Default::default()
  }
}

fn edge(name: &str) -> EdgeKindInput {
  EdgeKindInput { name: name.into(), is_traversable: true, ..Default::default() }
}

fn property(name: &str) -> PropertyInput {
  PropertyInput {
    name: name.into(),
    data_type: "string".into(),
    ..Default::default()
  }
}

fn environment(kind: &str, source: &str, principals: &[&str]) -> EnvironmentInput {
  EnvironmentInput {
    environment_kind_name: kind.into(),
    source_kind_name:      source.into(),
    principal_kinds:       principals.iter().map(|p| p.to_string()).collect(),
  }
}

fn finding(name: &str, display_name: &str, relationship: &str) -> FindingInput {
  FindingInput {
    name: name.into(),
    display_name: display_name.into(),
    environment_kind_name: "Tag_Tier_Zero".into(),
    source_kind_name: "Base".into(),
    relationship_kind_name: relationship.into(),
    remediation: RemediationInput {
      short_description: "short description".into(),
      long_description:  "long description".into(),
      short_remediation: "short remediation".into(),
      long_remediation:  "long remediation".into(),
    },
  }
}

/// A bare extension with node kinds only.
fn extension(name: &str, node_kinds: &[&str]) -> GraphExtensionInput {
  GraphExtensionInput {
    extension: ExtensionInput {
      name:         name.into(),
      display_name: "Test Extension".into(),
      version:      "1.0.0".into(),
      namespace:    "TST".into(),
    },
    node_kinds: node_kinds.iter().map(|n| node(n)).collect(),
    ..Default::default()
  }
}

/// An extension exercising every table: the environment kind and principal
/// kinds are node kinds it declares itself, the finding's relationship kind
/// one of its edge kinds.
fn full_extension(name: &str) -> GraphExtensionInput {
  GraphExtensionInput {
    edge_kinds: vec![edge("TST_MemberOf"), edge("TST_AdminTo")],
    properties: vec![property("tst_objectid"), property("tst_enabled")],
    environments: vec![environment("Tag_Tier_Zero", "Base", &["TST_User"])],
    findings: vec![finding("TST_Finding", "Test Finding", "TST_MemberOf")],
    ..extension(name, &["Tag_Tier_Zero", "Tag_Owned", "TST_User"])
  }
}

// ─── Create and update ───────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_reports_create_then_update() {
  let s = store().await;
  let input = full_extension("Test_Extension");

  assert!(!s.upsert_graph_extension(input.clone()).await.unwrap());
  assert!(s.upsert_graph_extension(input).await.unwrap());

  let extensions = s.list_extensions().await.unwrap();
  assert_eq!(extensions.len(), 1);
  assert_eq!(extensions[0].name, "Test_Extension");
  assert!(!extensions[0].is_builtin);
}

#[tokio::test]
async fn repeated_upsert_is_idempotent() {
  let s = store().await;
  let input = full_extension("Test_Extension");

  s.upsert_graph_extension(input.clone()).await.unwrap();
  let before = s.get_graph_schema("Test_Extension".into()).await.unwrap();

  s.upsert_graph_extension(input).await.unwrap();
  let after = s.get_graph_schema("Test_Extension".into()).await.unwrap();

  assert_eq!(before.extension.id, after.extension.id);
  assert_eq!(before.node_kinds, after.node_kinds);
  assert_eq!(before.edge_kinds, after.edge_kinds);
  assert_eq!(before.properties, after.properties);

  assert_eq!(after.environments.len(), 1);
  assert_eq!(after.environments[0].principal_kinds.len(), 1);
  assert_eq!(after.findings.len(), 1);
  assert_eq!(after.findings[0].finding.name, "TST_Finding");
  assert!(after.findings[0].remediation.is_some());
}

#[tokio::test]
async fn update_path_rewrites_extension_metadata() {
  let s = store().await;
  let mut input = extension("Test_Extension", &["N1"]);
  s.upsert_graph_extension(input.clone()).await.unwrap();
  let created = s.get_extension_by_name("Test_Extension".into()).await.unwrap();

  input.extension.display_name = "Renamed".into();
  input.extension.version = "2.0.0".into();
  input.extension.namespace = "NEW".into();
  s.upsert_graph_extension(input).await.unwrap();

  let updated = s.get_extension_by_name("Test_Extension".into()).await.unwrap();
  assert_eq!(updated.id, created.id);
  assert_eq!(updated.display_name, "Renamed");
  assert_eq!(updated.version, "2.0.0");
  assert_eq!(updated.namespace, "NEW");
  assert_eq!(updated.created_at, created.created_at);
}

// ─── Set reconciliation ──────────────────────────────────────────────────────

#[tokio::test]
async fn replacing_one_node_kind_keeps_the_others() {
  let s = store().await;
  let name = "Test_Extension_Upsert_Test";

  let mut first = extension(name, &["N1", "N2", "N3", "N4"]);
  first.node_kinds[0].description = "existing-variant".into();
  s.upsert_graph_extension(first).await.unwrap();
  let before = s.get_graph_schema(name.into()).await.unwrap();

  s.upsert_graph_extension(extension(name, &["N1", "N2", "N3", "updateN4"]))
    .await
    .unwrap();
  let after = s.get_graph_schema(name.into()).await.unwrap();

  let names: Vec<_> = after.node_kinds.iter().map(|n| n.name.as_str()).collect();
  assert_eq!(names, vec!["N1", "N2", "N3", "updateN4"]);
  for i in 0..3 {
    assert_eq!(after.node_kinds[i].id, before.node_kinds[i].id);
  }

  let replacement = &after.node_kinds[3];
  assert!(before.node_kinds.iter().all(|n| n.id != replacement.id));
  assert_eq!(replacement.schema_extension_id, after.extension.id);

  let removed = before.node_kinds[3].id;
  let err = s.within(move |tx| tx.get_node_kind_by_id(removed)).await.unwrap_err();
  assert!(core(err).is_not_found());
}

#[tokio::test]
async fn kept_rows_are_not_field_updated() {
  let s = store().await;
  let mut input = full_extension("Test_Extension");
  s.upsert_graph_extension(input.clone()).await.unwrap();

  input.node_kinds[2].description = "a new description".into();
  input.node_kinds[2].icon = "user".into();
  input.edge_kinds[0].is_traversable = false;
  input.properties[0].data_type = "integer".into();
  s.upsert_graph_extension(input).await.unwrap();

  let schema = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  let user = schema.node_kinds.iter().find(|n| n.name == "TST_User").unwrap();
  assert_eq!(user.description, "");
  assert_eq!(user.icon, "");
  assert!(schema.edge_kinds[0].is_traversable);
  assert_eq!(schema.properties[0].data_type, "string");
}

#[tokio::test]
async fn removed_members_become_unreachable() {
  let s = store().await;
  let input = full_extension("Test_Extension");
  s.upsert_graph_extension(input.clone()).await.unwrap();
  let before = s.get_graph_schema("Test_Extension".into()).await.unwrap();

  let trimmed = GraphExtensionInput {
    edge_kinds: vec![edge("TST_MemberOf")],
    properties: vec![],
    ..input
  };
  s.upsert_graph_extension(trimmed).await.unwrap();
  let after = s.get_graph_schema("Test_Extension".into()).await.unwrap();

  assert_eq!(after.edge_kinds.len(), 1);
  assert_eq!(after.edge_kinds[0].id, before.edge_kinds[0].id);
  assert!(after.properties.is_empty());

  let admin_to = before.edge_kinds[1].id;
  let err = s.within(move |tx| tx.get_edge_kind_by_id(admin_to)).await.unwrap_err();
  assert!(core(err).is_not_found());

  let objectid = before.properties[0].id;
  let err = s.within(move |tx| tx.get_property_by_id(objectid)).await.unwrap_err();
  assert!(core(err).is_not_found());
}

#[tokio::test]
async fn environments_and_findings_not_resupplied_are_removed() {
  let s = store().await;
  let input = full_extension("Test_Extension");
  s.upsert_graph_extension(input.clone()).await.unwrap();
  let before = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  let finding_id = before.findings[0].finding.id;

  let bare = GraphExtensionInput { environments: vec![], findings: vec![], ..input };
  s.upsert_graph_extension(bare).await.unwrap();

  let after = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  assert!(after.environments.is_empty());
  assert!(after.findings.is_empty());

  let err = s.get_finding_by_name("TST_Finding".into()).await.unwrap_err();
  assert!(core(err).is_not_found());
  let err = s.get_remediation(finding_id).await.unwrap_err();
  assert!(core(err).is_not_found());

  let environment_id = before.environments[0].environment.id;
  let principals = s.principal_kinds_by_environment(environment_id).await.unwrap();
  assert!(principals.is_empty());
}

#[tokio::test]
async fn node_kind_owned_elsewhere_is_a_duplicate_and_rolls_back() {
  let s = store().await;
  s.upsert_graph_extension(extension("First", &["Shared"])).await.unwrap();

  let err = s
    .upsert_graph_extension(extension("Second", &["Mine", "Shared"]))
    .await
    .unwrap_err();
  assert!(core(err).is_duplicate_name());

  let err = s.get_extension_by_name("Second".into()).await.unwrap_err();
  assert!(core(err).is_not_found());
}

// ─── Environments ────────────────────────────────────────────────────────────

#[tokio::test]
async fn environment_upsert_replaces_the_principal_kind_set() {
  let s = store().await;
  s.upsert_graph_extension(extension(
    "Test_Extension",
    &["Tag_Tier_Zero", "Tag_Owned"],
  ))
  .await
  .unwrap();
  let extension_id = s
    .get_extension_by_name("Test_Extension".into())
    .await
    .unwrap()
    .id;

  let first = s
    .upsert_schema_environment(
      extension_id,
      environment("Tag_Tier_Zero", "Base", &["Tag_Owned"]),
    )
    .await
    .unwrap();
  let second = s
    .upsert_schema_environment(
      extension_id,
      environment("Tag_Tier_Zero", "Base", &["Tag_Tier_Zero"]),
    )
    .await
    .unwrap();
  assert_ne!(first.id, second.id);

  let schema = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  assert_eq!(schema.environments.len(), 1);
  assert_eq!(schema.environments[0].environment.id, second.id);

  let tier_zero = s.register_kind("Tag_Tier_Zero".into()).await.unwrap();
  let principals = &schema.environments[0].principal_kinds;
  assert_eq!(principals.len(), 1);
  assert_eq!(principals[0].principal_kind, tier_zero.id);

  let stale = s.principal_kinds_by_environment(first.id).await.unwrap();
  assert!(stale.is_empty());
}

#[tokio::test]
async fn unknown_environment_kind_fails_without_writes() {
  let s = store().await;
  let input = GraphExtensionInput {
    environments: vec![environment("NonExistent", "Base", &[])],
    ..extension("Test_Extension", &["N1"])
  };

  let err = core(s.upsert_graph_extension(input).await.unwrap_err());
  assert!(err.is_reference_not_found());
  assert_eq!(err.to_string(), "environment kind 'NonExistent' not found");

  let err = s.get_extension_by_name("Test_Extension".into()).await.unwrap_err();
  assert!(core(err).is_not_found());
}

#[tokio::test]
async fn unknown_principal_kind_leaves_no_environment() {
  let s = store().await;
  s.upsert_graph_extension(extension("Test_Extension", &["Tag_Tier_Zero"]))
    .await
    .unwrap();
  let extension_id = s
    .get_extension_by_name("Test_Extension".into())
    .await
    .unwrap()
    .id;

  let err = s
    .upsert_schema_environment(
      extension_id,
      environment("Tag_Tier_Zero", "Base", &["Tag_Tier_Zero", "Tag_Missing"]),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    core(err),
    CoreError::PrincipalKindNotFound(name) if name == "Tag_Missing"
  ));

  let schema = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  assert!(schema.environments.is_empty());
}

#[tokio::test]
async fn unknown_source_kind_is_registered_on_first_use() {
  let s = store().await;
  let input = GraphExtensionInput {
    environments: vec![environment("Tag_Tier_Zero", "TST_Source", &[])],
    ..extension("Test_Extension", &["Tag_Tier_Zero"])
  };
  s.upsert_graph_extension(input).await.unwrap();

  let source = s.register_source_kind("TST_Source".into()).await.unwrap();
  let schema = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  assert_eq!(schema.environments[0].environment.source_kind_id, source.id);
  assert!(source.active);
}

#[tokio::test]
async fn deactivated_source_kind_is_reactivated_with_its_id() {
  let s = store().await;
  let base = s.register_source_kind("Base".into()).await.unwrap();
  assert_eq!(base.id, 1);

  s.deactivate_source_kind("Base".into()).await.unwrap();
  let hidden = s.within(|tx| tx.resolve_source_kind("Base")).await.unwrap();
  assert!(hidden.is_none());

  let input = GraphExtensionInput {
    environments: vec![environment("Tag_Tier_Zero", "Base", &[])],
    ..extension("Test_Extension", &["Tag_Tier_Zero"])
  };
  s.upsert_graph_extension(input).await.unwrap();

  let schema = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  assert_eq!(schema.environments[0].environment.source_kind_id, base.id);

  let err = s.deactivate_source_kind("NoSuchSource".into()).await.unwrap_err();
  assert!(core(err).is_not_found());
}

// ─── Findings and remediations ───────────────────────────────────────────────

#[tokio::test]
async fn finding_upsert_recreates_under_a_new_id() {
  let s = store().await;
  s.upsert_graph_extension(full_extension("Test_Extension")).await.unwrap();
  let extension_id = s
    .get_extension_by_name("Test_Extension".into())
    .await
    .unwrap()
    .id;

  let first = s
    .upsert_finding(extension_id, finding("T0Example", "First Name", "TST_MemberOf"))
    .await
    .unwrap();
  let second = s
    .upsert_finding(extension_id, finding("T0Example", "Second Name", "TST_AdminTo"))
    .await
    .unwrap();
  assert_ne!(first.id, second.id);

  let stored = s.get_finding_by_name("T0Example".into()).await.unwrap();
  assert_eq!(stored.id, second.id);
  assert_eq!(stored.display_name, "Second Name");

  let err = s.get_remediation(first.id).await.unwrap_err();
  assert!(core(err).is_not_found());
  let remediation = s.get_remediation(second.id).await.unwrap();
  assert_eq!(remediation.short_description, "short description");
}

#[tokio::test]
async fn remediation_is_updated_in_place() {
  let s = store().await;
  s.upsert_graph_extension(full_extension("Test_Extension")).await.unwrap();
  let finding_id = s.get_finding_by_name("TST_Finding".into()).await.unwrap().id;

  let revised = RemediationInput {
    short_description: "revised".into(),
    long_description:  "revised long".into(),
    short_remediation: "do this".into(),
    long_remediation:  "do this, then that".into(),
  };
  let written = s
    .within(move |tx| engine::upsert_remediation(tx, finding_id, &revised))
    .await
    .unwrap();
  assert_eq!(written.finding_id, finding_id);

  let stored = s.get_remediation(finding_id).await.unwrap();
  assert_eq!(stored.short_description, "revised");
  assert_eq!(stored.long_remediation, "do this, then that");
  assert_eq!(
    s.get_finding_by_name("TST_Finding".into()).await.unwrap().id,
    finding_id
  );
}

#[tokio::test]
async fn finding_without_environment_is_rejected() {
  let s = store().await;
  let input = GraphExtensionInput {
    environments: vec![],
    ..full_extension("Test_Extension")
  };

  let err = core(s.upsert_graph_extension(input).await.unwrap_err());
  assert!(matches!(err, CoreError::EnvironmentNotFound { .. }));

  let err = s.get_extension_by_name("Test_Extension".into()).await.unwrap_err();
  assert!(core(err).is_not_found());
}

#[tokio::test]
async fn failed_update_leaves_previous_state_intact() {
  let s = store().await;
  let input = full_extension("Test_Extension");
  s.upsert_graph_extension(input.clone()).await.unwrap();
  let before = s.get_graph_schema("Test_Extension".into()).await.unwrap();

  let mut broken = GraphExtensionInput {
    node_kinds: vec![node("Tag_Tier_Zero"), node("TST_Replacement")],
    findings: vec![finding("TST_Finding", "Test Finding", "TST_Missing")],
    ..input
  };
  broken.extension.version = "2.0.0".into();

  let err = core(s.upsert_graph_extension(broken).await.unwrap_err());
  assert!(matches!(err, CoreError::RelationshipKindNotFound(name) if name == "TST_Missing"));

  let after = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  assert_eq!(after.extension, before.extension);
  assert_eq!(after.node_kinds, before.node_kinds);
  assert_eq!(after.environments[0].environment, before.environments[0].environment);
  assert_eq!(after.findings[0].finding, before.findings[0].finding);
}

// ─── Nested scopes ───────────────────────────────────────────────────────────

/// Upsert `good`, then `bad`, inside one root transaction; then commit or
/// roll back the root. Returns the error `bad` produced and the outcome of
/// finishing the root.
fn good_then_bad(
  conn: &mut rusqlite::Connection,
  good: &GraphExtensionInput,
  bad: &GraphExtensionInput,
  commit: bool,
) -> graphschema_core::Result<(CoreError, graphschema_core::Result<()>)> {
  let mut uow = SqliteUnitOfWork::new(conn);
  let mut tx = uow.begin()?;
  upsert_graph_extension_in(&mut tx, good)?;
  let err = match upsert_graph_extension_in(&mut tx, bad) {
    Ok(_) => panic!("bad input was accepted"),
    Err(e) => e,
  };
  let finished = if commit { tx.commit() } else { tx.rollback() };
  Ok((err, finished))
}

fn bad_extension() -> GraphExtensionInput {
  GraphExtensionInput {
    findings: vec![finding("Bad_Finding", "Bad", "Nope")],
    ..full_extension("Bad")
  }
}

#[tokio::test]
async fn failed_nested_scope_fails_the_root_commit() {
  let s = store().await;
  let good = extension("Good", &["G1"]);
  let bad = GraphExtensionInput {
    findings: vec![finding("Bad_Finding", "Bad", "Nope")],
    environments: vec![environment("B1", "Base", &[])],
    ..extension("Bad", &["B1"])
  };

  let (err, committed) = s
    .conn
    .call(move |conn| Ok(good_then_bad(conn, &good, &bad, true)))
    .await
    .unwrap()
    .unwrap();
  assert!(err.is_reference_not_found());
  assert!(matches!(committed, Err(CoreError::Store { .. })));

  assert!(s.list_extensions().await.unwrap().is_empty());
  let kind = s.within(|tx| tx.resolve_kind("B1")).await.unwrap();
  assert!(kind.is_none());
  let kind = s.within(|tx| tx.resolve_kind("G1")).await.unwrap();
  assert!(kind.is_none());
}

#[tokio::test]
async fn root_rollback_discards_committed_nested_scopes() {
  let s = store().await;
  let good = extension("Good", &["G1"]);
  let bad = bad_extension();

  let (_, rolled_back) = s
    .conn
    .call(move |conn| Ok(good_then_bad(conn, &good, &bad, false)))
    .await
    .unwrap()
    .unwrap();
  rolled_back.unwrap();

  assert!(s.list_extensions().await.unwrap().is_empty());
}

#[tokio::test]
async fn committed_nested_scopes_commit_with_the_root() {
  let s = store().await;
  let first = extension("First", &["F1"]);
  let second = extension("Second", &["S1"]);

  s.conn
    .call(move |conn| {
      let mut uow = SqliteUnitOfWork::new(conn);
      let outcome = uow.begin().and_then(|mut tx| {
        upsert_graph_extension_in(&mut tx, &first)?;
        upsert_graph_extension_in(&mut tx, &second)?;
        tx.commit()
      });
      Ok(outcome)
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(s.list_extensions().await.unwrap().len(), 2);
}

// ─── Built-in protection ─────────────────────────────────────────────────────

#[tokio::test]
async fn builtin_extension_is_immutable() {
  let s = store().await;
  let builtin = full_extension("Builtin_Extension");

  assert!(s.seed_builtin_extension(builtin.clone()).await.unwrap());
  assert!(!s.seed_builtin_extension(builtin.clone()).await.unwrap());
  let before = s.get_graph_schema("Builtin_Extension".into()).await.unwrap();
  assert!(before.extension.is_builtin);
  assert_eq!(before.node_kinds.len(), 3);
  assert_eq!(before.findings.len(), 1);

  let mut changed = GraphExtensionInput {
    node_kinds: vec![node("Tag_Tier_Zero")],
    ..builtin
  };
  changed.extension.display_name = "Changed".into();
  let err = core(s.upsert_graph_extension(changed).await.unwrap_err());
  assert!(err.is_builtin_immutable());

  let err = s.delete_schema_extension(before.extension.id).await.unwrap_err();
  assert!(core(err).is_builtin_immutable());

  let err = s
    .upsert_schema_environment(
      before.extension.id,
      environment("Tag_Tier_Zero", "Base", &["Tag_Owned"]),
    )
    .await
    .unwrap_err();
  assert!(core(err).is_builtin_immutable());

  let after = s.get_graph_schema("Builtin_Extension".into()).await.unwrap();
  assert_eq!(after.extension, before.extension);
  assert_eq!(after.node_kinds, before.node_kinds);
  assert_eq!(after.edge_kinds, before.edge_kinds);
  assert_eq!(after.properties, before.properties);
  assert_eq!(after.environments[0].environment, before.environments[0].environment);
  assert_eq!(after.findings[0].finding, before.findings[0].finding);
}

#[tokio::test]
async fn builtin_check_precedes_validation() {
  let s = store().await;
  s.seed_builtin_extension(full_extension("Builtin_Extension")).await.unwrap();

  let invalid = extension("Builtin_Extension", &["Dup", "Dup"]);
  let err = core(s.upsert_graph_extension(invalid).await.unwrap_err());
  assert!(err.is_builtin_immutable());
}

#[tokio::test]
async fn builtin_environment_pairing_cannot_be_taken_over() {
  let s = store().await;
  s.seed_builtin_extension(full_extension("Builtin_Extension")).await.unwrap();
  let before = s.get_graph_schema("Builtin_Extension".into()).await.unwrap();

  let other = GraphExtensionInput {
    environments: vec![environment("Tag_Tier_Zero", "Base", &[])],
    ..extension("Other", &["OT_User"])
  };
  let err = core(s.upsert_graph_extension(other).await.unwrap_err());
  assert!(err.is_builtin_immutable());

  let after = s.get_graph_schema("Builtin_Extension".into()).await.unwrap();
  assert_eq!(after.environments.len(), 1);
  assert_eq!(after.environments[0].environment, before.environments[0].environment);
  assert_eq!(after.findings.len(), 1);
  assert_eq!(after.findings[0].finding, before.findings[0].finding);
  let err = s.get_extension_by_name("Other".into()).await.unwrap_err();
  assert!(core(err).is_not_found());
}

#[tokio::test]
async fn builtin_finding_name_cannot_be_taken_over() {
  let s = store().await;
  s.seed_builtin_extension(full_extension("Builtin_Extension")).await.unwrap();
  let before = s.get_finding_by_name("TST_Finding".into()).await.unwrap();

  let other = GraphExtensionInput {
    edge_kinds: vec![edge("OT_AdminTo")],
    environments: vec![environment("Tag_Tier_Zero", "AZBase", &[])],
    findings: vec![FindingInput {
      source_kind_name: "AZBase".into(),
      ..finding("TST_Finding", "Hijacked", "OT_AdminTo")
    }],
    ..extension("Other", &["OT_User"])
  };
  let err = core(s.upsert_graph_extension(other).await.unwrap_err());
  assert!(err.is_builtin_immutable());

  let after = s.get_finding_by_name("TST_Finding".into()).await.unwrap();
  assert_eq!(after, before);
  s.get_remediation(after.id).await.unwrap();
  let err = s.get_extension_by_name("Other".into()).await.unwrap_err();
  assert!(core(err).is_not_found());
}

#[tokio::test]
async fn finding_upsert_against_builtin_is_rejected() {
  let s = store().await;
  s.seed_builtin_extension(full_extension("Builtin_Extension")).await.unwrap();
  let builtin_id = s
    .get_extension_by_name("Builtin_Extension".into())
    .await
    .unwrap()
    .id;

  let err = s
    .upsert_finding(builtin_id, finding("T0Example", "Example", "TST_MemberOf"))
    .await
    .unwrap_err();
  assert!(core(err).is_builtin_immutable());

  let err = s.get_finding_by_name("T0Example".into()).await.unwrap_err();
  assert!(core(err).is_not_found());
}

#[tokio::test]
async fn environment_pairing_of_another_extension_is_a_duplicate() {
  let s = store().await;
  s.upsert_graph_extension(full_extension("First")).await.unwrap();
  let before = s.get_graph_schema("First".into()).await.unwrap();

  let second = GraphExtensionInput {
    environments: vec![environment("Tag_Tier_Zero", "Base", &[])],
    ..extension("Second", &["SE_User"])
  };
  let err = core(s.upsert_graph_extension(second).await.unwrap_err());
  assert!(matches!(
    err,
    CoreError::DuplicateName { entity: Entity::Environment, .. }
  ));

  let after = s.get_graph_schema("First".into()).await.unwrap();
  assert_eq!(after.environments[0].environment, before.environments[0].environment);
  assert_eq!(after.findings[0].finding, before.findings[0].finding);

  // Nor can another extension bind a finding to that environment.
  let second_id = {
    s.upsert_graph_extension(extension("Second", &["SE_User"])).await.unwrap();
    s.get_extension_by_name("Second".into()).await.unwrap().id
  };
  let err = s
    .upsert_finding(second_id, finding("SE_Finding", "Second", "TST_AdminTo"))
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::EnvironmentNotFound { .. }));
}

// ─── Cascade delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_every_dependent() {
  let s = store().await;
  s.upsert_graph_extension(full_extension("Test_Extension")).await.unwrap();
  let schema = s.get_graph_schema("Test_Extension".into()).await.unwrap();

  s.delete_schema_extension(schema.extension.id).await.unwrap();

  let err = s.get_extension_by_name("Test_Extension".into()).await.unwrap_err();
  assert!(core(err).is_not_found());

  for node_kind in &schema.node_kinds {
    let id = node_kind.id;
    let err = s.within(move |tx| tx.get_node_kind_by_id(id)).await.unwrap_err();
    assert!(core(err).is_not_found());
  }
  for edge_kind in &schema.edge_kinds {
    let id = edge_kind.id;
    let err = s.within(move |tx| tx.get_edge_kind_by_id(id)).await.unwrap_err();
    assert!(core(err).is_not_found());
  }
  for property in &schema.properties {
    let id = property.id;
    let err = s.within(move |tx| tx.get_property_by_id(id)).await.unwrap_err();
    assert!(core(err).is_not_found());
  }
  for view in &schema.environments {
    let id = view.environment.id;
    let err = s.within(move |tx| tx.get_environment_by_id(id)).await.unwrap_err();
    assert!(core(err).is_not_found());
    assert!(s.principal_kinds_by_environment(id).await.unwrap().is_empty());
  }
  for view in &schema.findings {
    let id = view.finding.id;
    let err = s.within(move |tx| tx.get_finding_by_id(id)).await.unwrap_err();
    assert!(core(err).is_not_found());
    let err = s.get_remediation(id).await.unwrap_err();
    assert!(core(err).is_not_found());
  }

  // The shared kind table keeps its names.
  let kind = s.register_kind("TST_User".into()).await.unwrap();
  assert!(kind.id > 0);
}

#[tokio::test]
async fn delete_of_unknown_extension_is_not_found() {
  let s = store().await;
  let err = s.delete_schema_extension(42).await.unwrap_err();
  assert!(core(err).is_not_found());
}

#[tokio::test]
async fn recreated_extension_gets_fresh_ids() {
  let s = store().await;
  let input = extension("Test_Extension", &["N1"]);
  s.upsert_graph_extension(input.clone()).await.unwrap();
  let first = s.get_graph_schema("Test_Extension".into()).await.unwrap();

  s.delete_schema_extension(first.extension.id).await.unwrap();
  assert!(!s.upsert_graph_extension(input).await.unwrap());

  let second = s.get_graph_schema("Test_Extension".into()).await.unwrap();
  assert_ne!(second.extension.id, first.extension.id);
  assert_ne!(second.node_kinds[0].id, first.node_kinds[0].id);
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
  let s = store().await;

  let err = s
    .upsert_graph_extension(extension("Test_Extension", &["N1", "N1"]))
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::Validation(_)));

  let err = s.upsert_graph_extension(extension("", &["N1"])).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Validation(_)));

  assert!(s.list_extensions().await.unwrap().is_empty());
}
