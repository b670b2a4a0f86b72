//! Name-keyed set reconciliation.
//!
//! Computes the create / keep / delete decisions that bring an existing set
//! of stored rows in line with a desired set, matching on a business key
//! rather than on surrogate ids. One algorithm serves node kinds, edge kinds
//! and properties; callers supply the key extraction and the store writes.

use std::{
  collections::{HashMap, HashSet},
  hash::Hash,
};

use crate::Result;

/// What happens to one desired entry.
#[derive(Debug)]
pub enum Action<'a, D, E> {
  /// No stored row has this key; a new row will be created.
  Create(&'a D),
  /// A stored row already has this key and is kept as-is, surrogate id and
  /// all. No field-level update is applied.
  Keep(&'a E),
}

/// The outcome of diffing a desired set against an existing one.
#[derive(Debug)]
pub struct Diff<'a, D, E> {
  /// One action per desired entry, in desired order.
  pub actions: Vec<Action<'a, D, E>>,
  /// Stored rows whose key is absent from the desired set, in stored order.
  pub stale:   Vec<&'a E>,
}

impl<'a, D, E> Diff<'a, D, E> {
  pub fn to_create(&self) -> impl Iterator<Item = &'a D> + '_ {
    self.actions.iter().filter_map(|action| match action {
      Action::Create(desired) => Some(*desired),
      Action::Keep(_) => None,
    })
  }

  pub fn kept(&self) -> impl Iterator<Item = &'a E> + '_ {
    self.actions.iter().filter_map(|action| match action {
      Action::Keep(existing) => Some(*existing),
      Action::Create(_) => None,
    })
  }

  pub fn is_noop(&self) -> bool {
    self.stale.is_empty() && self.to_create().next().is_none()
  }
}

/// Partition `desired` and `existing` by key.
///
/// Keys repeated within `desired` are a caller error: every occurrence is
/// planned independently. Validate uniqueness first.
pub fn diff<'a, D, E, K>(
  desired: &'a [D],
  existing: &'a [E],
  desired_key: impl Fn(&'a D) -> K,
  existing_key: impl Fn(&'a E) -> K,
) -> Diff<'a, D, E>
where
  K: Eq + Hash,
{
  let wanted: HashSet<K> = desired.iter().map(&desired_key).collect();

  let mut stored: HashMap<K, &'a E> = HashMap::with_capacity(existing.len());
  let mut stale = vec![];
  for row in existing {
    let key = existing_key(row);
    if wanted.contains(&key) {
      stored.insert(key, row);
    } else {
      stale.push(row);
    }
  }

  let actions = desired
    .iter()
    .map(|entry| match stored.get(&desired_key(entry)) {
      Some(row) => Action::Keep(*row),
      None => Action::Create(entry),
    })
    .collect();

  Diff { actions, stale }
}

/// Apply a [`diff`] through the supplied store writes.
///
/// Stale rows are deleted first (by surrogate id, inside `delete`) so that
/// nothing still references them when new rows arrive. Returns the
/// reconciled set in desired order: kept rows with their original ids and
/// freshly created rows with their new ids.
///
/// Fails fast on the first write error. The caller owns the transaction that
/// makes a partial application invisible.
pub fn reconcile<'a, D, E, K>(
  desired: &'a [D],
  existing: &'a [E],
  desired_key: impl Fn(&'a D) -> K,
  existing_key: impl Fn(&'a E) -> K,
  mut delete: impl FnMut(&E) -> Result<()>,
  mut create: impl FnMut(&D) -> Result<E>,
) -> Result<Vec<E>>
where
  E: Clone,
  K: Eq + Hash,
{
  let plan = diff(desired, existing, desired_key, existing_key);

  for row in &plan.stale {
    delete(*row)?;
  }

  plan
    .actions
    .iter()
    .map(|action| match action {
      Action::Keep(row) => Ok((*row).clone()),
      Action::Create(entry) => create(*entry),
    })
    .collect()
}

/// Return the first key that occurs more than once in `items`.
pub fn first_duplicate<'a, T, K>(
  items: &'a [T],
  key: impl Fn(&'a T) -> K,
) -> Option<K>
where
  K: Eq + Hash,
{
  let mut seen = HashSet::with_capacity(items.len());
  for item in items {
    let k = key(item);
    if seen.contains(&k) {
      return Some(k);
    }
    seen.insert(k);
  }
  None
}
