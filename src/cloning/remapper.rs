use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::database::entities::Level;
use crate::errors::CloneError;

/// Outcome of remapping one nullable parent reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// The source row had no reference
    Absent,
    Resolved(i32),
    /// The source row referenced an id that was never cloned
    Unresolved(i32),
}

impl ParentRef {
    pub fn resolved(&self) -> Option<i32> {
        match self {
            ParentRef::Resolved(id) => Some(*id),
            _ => None,
        }
    }
}

/// Per-level source id to destination id tables for one clone run.
///
/// A level is sealed once all of its rows were cloned. Lookups against a
/// level that is not sealed yet are ordering mistakes and fail, so an
/// unresolved id on a sealed level always means the source row pointed
/// outside the source container.
#[derive(Debug, Default)]
pub struct IdentityRemapper {
    tables: HashMap<Level, HashMap<i32, i32>>,
    sealed: BTreeSet<Level>,
}

impl IdentityRemapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        level: Level,
        source_id: i32,
        destination_id: i32,
    ) -> Result<(), CloneError> {
        if self.is_sealed(level) {
            return Err(CloneError::OutOfOrder { level });
        }

        let table = self.tables.entry(level).or_default();
        if table.contains_key(&source_id) {
            return Err(CloneError::DuplicateMapping { level, source_id });
        }
        table.insert(source_id, destination_id);
        Ok(())
    }

    /// Destination id for `source_id`, or `None` when it was never recorded.
    pub fn resolve(&self, level: Level, source_id: i32) -> Result<Option<i32>, CloneError> {
        if !self.is_sealed(level) {
            return Err(CloneError::OutOfOrder { level });
        }
        Ok(self
            .tables
            .get(&level)
            .and_then(|table| table.get(&source_id))
            .copied())
    }

    /// Resolve a nullable reference, keeping "no reference" apart from
    /// "reference that did not map".
    pub fn remap(&self, level: Level, source_id: Option<i32>) -> Result<ParentRef, CloneError> {
        let Some(source_id) = source_id else {
            return Ok(ParentRef::Absent);
        };
        Ok(match self.resolve(level, source_id)? {
            Some(destination_id) => ParentRef::Resolved(destination_id),
            None => ParentRef::Unresolved(source_id),
        })
    }

    pub fn seal(&mut self, level: Level) {
        self.sealed.insert(level);
    }

    pub fn is_sealed(&self, level: Level) -> bool {
        self.sealed.contains(&level)
    }

    pub fn len(&self, level: Level) -> usize {
        self.tables.get(&level).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(HashMap::is_empty)
    }

    pub fn into_mappings(mut self) -> CloneMappings {
        let mut take = |level: Level| -> BTreeMap<i32, i32> {
            self.tables
                .remove(&level)
                .map(|table| table.into_iter().collect())
                .unwrap_or_default()
        };

        CloneMappings {
            categories: take(Level::Category),
            topics: take(Level::Topic),
            factors: take(Level::Factor),
        }
    }
}

/// Source id to destination id for each level that other levels reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneMappings {
    pub categories: BTreeMap<i32, i32>,
    pub topics: BTreeMap<i32, i32>,
    pub factors: BTreeMap<i32, i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_resolve() {
        let mut remapper = IdentityRemapper::new();
        remapper.record(Level::Category, 1, 101).unwrap();
        remapper.record(Level::Category, 2, 102).unwrap();
        remapper.seal(Level::Category);

        assert_eq!(remapper.resolve(Level::Category, 1).unwrap(), Some(101));
        assert_eq!(remapper.resolve(Level::Category, 3).unwrap(), None);
        assert_eq!(remapper.len(Level::Category), 2);
    }

    #[test]
    fn test_double_record_is_rejected() {
        let mut remapper = IdentityRemapper::new();
        remapper.record(Level::Topic, 7, 70).unwrap();

        let err = remapper.record(Level::Topic, 7, 71).unwrap_err();
        assert!(matches!(
            err,
            CloneError::DuplicateMapping {
                level: Level::Topic,
                source_id: 7
            }
        ));

        // same source id on another level is fine
        remapper.record(Level::Factor, 7, 72).unwrap();
    }

    #[test]
    fn test_resolving_unsealed_level_is_out_of_order() {
        let mut remapper = IdentityRemapper::new();
        remapper.record(Level::Category, 1, 10).unwrap();

        let err = remapper.resolve(Level::Category, 1).unwrap_err();
        assert!(err.is_misuse());
    }

    #[test]
    fn test_recording_into_sealed_level_is_out_of_order() {
        let mut remapper = IdentityRemapper::new();
        remapper.seal(Level::Category);
        assert!(matches!(
            remapper.record(Level::Category, 1, 10),
            Err(CloneError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_remap_distinguishes_absent_from_unresolved() {
        let mut remapper = IdentityRemapper::new();
        remapper.record(Level::Topic, 5, 50).unwrap();
        remapper.seal(Level::Topic);

        assert_eq!(remapper.remap(Level::Topic, None).unwrap(), ParentRef::Absent);
        assert_eq!(
            remapper.remap(Level::Topic, Some(5)).unwrap(),
            ParentRef::Resolved(50)
        );
        assert_eq!(
            remapper.remap(Level::Topic, Some(6)).unwrap(),
            ParentRef::Unresolved(6)
        );
    }

    #[test]
    fn test_into_mappings() {
        let mut remapper = IdentityRemapper::new();
        assert!(remapper.is_empty());
        remapper.record(Level::Category, 2, 20).unwrap();
        remapper.record(Level::Factor, 3, 30).unwrap();

        let mappings = remapper.into_mappings();
        assert_eq!(mappings.categories.get(&2), Some(&20));
        assert!(mappings.topics.is_empty());
        assert_eq!(mappings.factors.len(), 1);
    }
}
