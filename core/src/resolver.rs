//! Temp id → real id table.
//!
//! # Design
//! Slots live in a `Vec` and are found through a `HashMap` index. A slot is
//! allocated when a creating command is enqueued and filled at most once,
//! when that command is applied. Slots of failed commands stay empty for good;
//! a temp id is never reused.

use std::collections::HashMap;

use crate::command::{ComplexId, TempId};
use crate::error::{UnresolvedReferenceError, ValidationError};

#[derive(Debug, Clone, Default)]
pub struct TempIdResolver {
    slots: Vec<Slot>,
    index: HashMap<TempId, usize>,
}

#[derive(Debug, Clone)]
struct Slot {
    temp_id: TempId,
    real_id: Option<String>,
}

impl TempIdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an unresolved slot for `temp_id`.
    pub fn register(&mut self, temp_id: TempId) -> Result<(), ValidationError> {
        if self.index.contains_key(&temp_id) {
            return Err(ValidationError::DuplicateTempId(temp_id));
        }
        self.index.insert(temp_id.clone(), self.slots.len());
        self.slots.push(Slot {
            temp_id,
            real_id: None,
        });
        Ok(())
    }

    /// Record the real id of a registered temp id.
    ///
    /// # Panics
    /// If `temp_id` was never registered or is already resolved. Both are
    /// bugs in the caller, not conditions a response can legitimately produce.
    pub fn resolve(&mut self, temp_id: &TempId, real_id: impl Into<String>) {
        let Some(&slot) = self.index.get(temp_id) else {
            panic!("temp id `{temp_id}` was never registered");
        };
        let slot = &mut self.slots[slot];
        assert!(
            slot.real_id.is_none(),
            "temp id `{temp_id}` is already resolved"
        );
        slot.real_id = Some(real_id.into());
    }

    pub fn lookup(&self, temp_id: &TempId) -> Result<&str, UnresolvedReferenceError> {
        self.index
            .get(temp_id)
            .and_then(|&slot| self.slots[slot].real_id.as_deref())
            .ok_or_else(|| UnresolvedReferenceError {
                temp_id: temp_id.clone(),
            })
    }

    /// Real id behind `id`; real ids pass through untouched.
    pub fn lookup_id(&self, id: &ComplexId) -> Result<String, UnresolvedReferenceError> {
        match id {
            ComplexId::Real(real) => Ok(real.clone()),
            ComplexId::Temp(temp) => self.lookup(temp).map(str::to_string),
        }
    }

    pub fn contains(&self, temp_id: &TempId) -> bool {
        self.index.contains_key(temp_id)
    }

    pub fn is_resolved(&self, temp_id: &TempId) -> bool {
        self.lookup(temp_id).is_ok()
    }

    /// Resolved pairs, in registration order.
    pub fn resolved(&self) -> impl Iterator<Item = (&TempId, &str)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.real_id.as_deref().map(|real| (&slot.temp_id, real)))
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved().count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: &str) -> TempId {
        TempId::new(id)
    }

    #[test]
    fn lookup_before_resolution_fails() {
        let mut resolver = TempIdResolver::new();
        resolver.register(t("t1")).unwrap();
        let err = resolver.lookup(&t("t1")).unwrap_err();
        assert_eq!(err.temp_id, t("t1"));
    }

    #[test]
    fn lookup_unknown_temp_id_fails() {
        let resolver = TempIdResolver::new();
        assert!(resolver.lookup(&t("nope")).is_err());
    }

    #[test]
    fn resolve_then_lookup() {
        let mut resolver = TempIdResolver::new();
        resolver.register(t("t1")).unwrap();
        resolver.register(t("t2")).unwrap();
        resolver.resolve(&t("t2"), "200");

        assert_eq!(resolver.lookup(&t("t2")).unwrap(), "200");
        assert!(!resolver.is_resolved(&t("t1")));
        assert_eq!(resolver.resolved_count(), 1);
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut resolver = TempIdResolver::new();
        resolver.register(t("t1")).unwrap();
        let err = resolver.register(t("t1")).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateTempId(t("t1")));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    #[should_panic(expected = "already resolved")]
    fn resolving_twice_panics() {
        let mut resolver = TempIdResolver::new();
        resolver.register(t("t1")).unwrap();
        resolver.resolve(&t("t1"), "100");
        resolver.resolve(&t("t1"), "101");
    }

    #[test]
    #[should_panic(expected = "never registered")]
    fn resolving_unregistered_panics() {
        let mut resolver = TempIdResolver::new();
        resolver.resolve(&t("ghost"), "1");
    }

    #[test]
    fn lookup_id_passes_real_ids_through() {
        let mut resolver = TempIdResolver::new();
        resolver.register(t("t1")).unwrap();
        resolver.resolve(&t("t1"), "100");

        assert_eq!(resolver.lookup_id(&ComplexId::real("7")).unwrap(), "7");
        assert_eq!(resolver.lookup_id(&ComplexId::from(t("t1"))).unwrap(), "100");
    }

    #[test]
    fn resolved_keeps_registration_order() {
        let mut resolver = TempIdResolver::new();
        for id in ["a", "b", "c"] {
            resolver.register(t(id)).unwrap();
        }
        resolver.resolve(&t("c"), "3");
        resolver.resolve(&t("a"), "1");

        let pairs: Vec<_> = resolver
            .resolved()
            .map(|(temp, real)| (temp.as_str().to_string(), real.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![("a".to_string(), "1".to_string()), ("c".to_string(), "3".to_string())]
        );
    }
}
