//! In-memory reference store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use strata_types::ObjectId;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::Ref;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Entry {
    Id(ObjectId),
    Symbolic(String),
}

/// A [`RefStore`] backed by a sorted map behind a `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, Entry>>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_map(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Entry>>> {
        self.refs
            .read()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))
    }

    fn write_map(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Entry>>> {
        self.refs
            .write()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))
    }
}

fn resolve_entry(map: &BTreeMap<String, Entry>, name: &str) -> Option<Ref> {
    match map.get(name)? {
        Entry::Id(id) => Some(Ref::direct(name, *id)),
        Entry::Symbolic(target) => match map.get(target)? {
            Entry::Id(id) => Some(Ref::Symbolic {
                name: name.to_string(),
                target: target.clone(),
                object_id: *id,
            }),
            Entry::Symbolic(_) => None,
        },
    }
}

/// The direct name a write to `name` lands on.
fn write_target(map: &BTreeMap<String, Entry>, name: &str) -> String {
    match map.get(name) {
        Some(Entry::Symbolic(target)) => target.clone(),
        _ => name.to_string(),
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        let map = self.read_map()?;
        Ok(resolve_entry(&map, name))
    }

    fn write_ref(&self, name: &str, object_id: ObjectId) -> Result<()> {
        validate_ref_name(name)?;
        let mut map = self.write_map()?;
        let target = write_target(&map, name);
        debug!(name = %target, to = %object_id.short_hex(), "ref updated");
        map.insert(target, Entry::Id(object_id));
        Ok(())
    }

    fn write_symbolic(&self, name: &str, target: &str) -> Result<()> {
        validate_ref_name(name)?;
        validate_ref_name(target)?;
        let mut map = self.write_map()?;
        if name == target || matches!(map.get(target), Some(Entry::Symbolic(_))) {
            return Err(RefError::InvalidSymbolicTarget {
                name: name.to_string(),
                target: target.to_string(),
            });
        }
        map.insert(name.to_string(), Entry::Symbolic(target.to_string()));
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<Option<Ref>> {
        let mut map = self.write_map()?;
        let previous = resolve_entry(&map, name);
        if map.remove(name).is_some() {
            debug!(name, "ref deleted");
        }
        Ok(previous)
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>> {
        let map = self.read_map()?;
        Ok(map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter_map(|k| resolve_entry(&map, k))
            .collect())
    }

    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<Ref> {
        validate_ref_name(name)?;
        let mut map = self.write_map()?;
        let actual = resolve_entry(&map, name).map(|r| r.object_id());
        if actual != expected {
            return Err(RefError::Conflict {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        let target = write_target(&map, name);
        map.insert(target, Entry::Id(new));
        resolve_entry(&map, name).ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })
    }
}
