//! In-memory document store.
//!
//! Each entity kind lives in its own [`Collection`]. A collection offers the four capabilities
//! record services rely on: persist (insert/update), query by filter, fetch by id and unique
//! constraints declared by the entity. Rows keep insertion order.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::appointments::Appointment;
use crate::diagnoses::Diagnosis;
use crate::patients::Patient;
use crate::prescriptions::Prescription;
use crate::users::User;
use crate::{RecordError, RecordResult};

/// A document that can be stored in a [`Collection`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable kind used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    /// `(constraint, value)` pairs that must be unique across the collection.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Thread-safe collection of one entity kind.
pub struct Collection<T> {
    rows: RwLock<Vec<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Entity> Collection<T> {
    fn read(&self) -> RecordResult<RwLockReadGuard<'_, Vec<T>>> {
        self.rows.read().map_err(|_| RecordError::StorePoisoned)
    }

    fn write(&self) -> RecordResult<RwLockWriteGuard<'_, Vec<T>>> {
        self.rows.write().map_err(|_| RecordError::StorePoisoned)
    }

    /// Persist a new entity, enforcing unique constraints.
    pub fn insert(&self, entity: T) -> RecordResult<T> {
        self.insert_checked(entity, |_| Ok(()))
    }

    /// Persist a new entity after `check` accepts the current rows.
    ///
    /// `check` runs under the same write lock as the insert, so no competing insert can slip
    /// in between the check and the write.
    pub fn insert_checked(
        &self,
        entity: T,
        check: impl FnOnce(&[T]) -> RecordResult<()>,
    ) -> RecordResult<T> {
        let mut rows = self.write()?;
        check(&rows)?;
        ensure_unique(&rows, &entity)?;
        rows.push(entity.clone());
        Ok(entity)
    }

    pub fn get(&self, id: Uuid) -> RecordResult<T> {
        self.read()?
            .iter()
            .find(|row| row.id() == id)
            .cloned()
            .ok_or(RecordError::NotFound { kind: T::KIND, id })
    }

    pub fn find(&self, filter: impl Fn(&T) -> bool) -> RecordResult<Vec<T>> {
        Ok(self.read()?.iter().filter(|row| filter(row)).cloned().collect())
    }

    pub fn find_one(&self, filter: impl Fn(&T) -> bool) -> RecordResult<Option<T>> {
        Ok(self.read()?.iter().find(|row| filter(row)).cloned())
    }

    pub fn count(&self, filter: impl Fn(&T) -> bool) -> RecordResult<usize> {
        Ok(self.read()?.iter().filter(|row| filter(row)).count())
    }

    /// Apply `mutate` to a copy of the entity and persist it if the mutation succeeds and the
    /// result still satisfies unique constraints. The stored row is untouched on error.
    pub fn update(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut T) -> RecordResult<()>,
    ) -> RecordResult<T> {
        self.update_with(id, mutate).map(|(updated, ())| updated)
    }

    /// Like [`Collection::update`], also handing back whatever `mutate` computed under the lock.
    pub fn update_with<R>(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut T) -> RecordResult<R>,
    ) -> RecordResult<(T, R)> {
        let mut rows = self.write()?;
        let index = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or(RecordError::NotFound { kind: T::KIND, id })?;

        let mut updated = rows[index].clone();
        let output = mutate(&mut updated)?;
        if updated.id() != id {
            return Err(RecordError::InvalidInput(format!(
                "{} id cannot change",
                T::KIND
            )));
        }
        ensure_unique(&rows, &updated)?;
        rows[index] = updated.clone();
        Ok((updated, output))
    }
}

/// The row sharing `entity`'s id is skipped, so updates may keep their own values.
fn ensure_unique<T: Entity>(rows: &[T], entity: &T) -> RecordResult<()> {
    for (constraint, value) in entity.unique_keys() {
        let clash = rows.iter().any(|row| {
            row.id() != entity.id()
                && row
                    .unique_keys()
                    .iter()
                    .any(|(c, v)| *c == constraint && *v == value)
        });
        if clash {
            return Err(RecordError::Conflict(format!(
                "{} with {} already exists",
                T::KIND,
                constraint
            )));
        }
    }
    Ok(())
}

/// All collections backing the record services.
#[derive(Default)]
pub struct Store {
    pub users: Collection<User>,
    pub patients: Collection<Patient>,
    pub appointments: Collection<Appointment>,
    pub diagnoses: Collection<Diagnosis>,
    pub prescriptions: Collection<Prescription>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Widget {
        id: Uuid,
        code: String,
    }

    impl Entity for Widget {
        const KIND: &'static str = "widget";

        fn id(&self) -> Uuid {
            self.id
        }

        fn unique_keys(&self) -> Vec<(&'static str, String)> {
            vec![("code", self.code.clone())]
        }
    }

    fn widget(code: &str) -> Widget {
        Widget {
            id: Uuid::new_v4(),
            code: code.into(),
        }
    }

    #[test]
    fn insert_then_get() {
        let collection = Collection::default();
        let w = collection.insert(widget("a")).unwrap();
        assert_eq!(collection.get(w.id).unwrap(), w);
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let collection: Collection<Widget> = Collection::default();
        let id = Uuid::new_v4();
        assert!(matches!(
            collection.get(id),
            Err(RecordError::NotFound { kind: "widget", id: missing }) if missing == id
        ));
    }

    #[test]
    fn unique_constraint_is_enforced_on_insert() {
        let collection = Collection::default();
        collection.insert(widget("a")).unwrap();
        let err = collection.insert(widget("a")).unwrap_err();
        assert!(matches!(err, RecordError::Conflict(msg) if msg.contains("code")));
    }

    #[test]
    fn unique_constraint_is_enforced_on_update() {
        let collection = Collection::default();
        collection.insert(widget("a")).unwrap();
        let b = collection.insert(widget("b")).unwrap();

        let err = collection
            .update(b.id, |w| {
                w.code = "a".into();
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, RecordError::Conflict(_)));
        assert_eq!(collection.get(b.id).unwrap().code, "b");
    }

    #[test]
    fn update_keeping_own_unique_value_is_allowed() {
        let collection = Collection::default();
        let a = collection.insert(widget("a")).unwrap();
        let updated = collection.update(a.id, |_| Ok(())).unwrap();
        assert_eq!(updated, a);
    }

    #[test]
    fn failed_mutation_leaves_row_untouched() {
        let collection = Collection::default();
        let a = collection.insert(widget("a")).unwrap();
        let result = collection.update(a.id, |w| {
            w.code = "changed".into();
            Err(RecordError::InvalidInput("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(collection.get(a.id).unwrap().code, "a");
    }

    #[test]
    fn update_with_returns_the_computed_value() {
        let collection = Collection::default();
        let a = collection.insert(widget("a")).unwrap();
        let (updated, previous) = collection
            .update_with(a.id, |w| Ok(std::mem::replace(&mut w.code, "z".into())))
            .unwrap();
        assert_eq!(previous, "a");
        assert_eq!(updated.code, "z");
        assert_eq!(collection.get(a.id).unwrap().code, "z");
    }

    #[test]
    fn find_preserves_insertion_order() {
        let collection = Collection::default();
        for code in ["c", "a", "b"] {
            collection.insert(widget(code)).unwrap();
        }
        let codes: Vec<String> = collection
            .find(|_| true)
            .unwrap()
            .into_iter()
            .map(|w| w.code)
            .collect();
        assert_eq!(codes, vec!["c", "a", "b"]);
        assert_eq!(collection.count(|w| w.code != "a").unwrap(), 2);
    }

    #[test]
    fn insert_checked_rejects_when_check_fails() {
        let collection = Collection::default();
        collection.insert(widget("a")).unwrap();
        let err = collection
            .insert_checked(widget("b"), |rows| {
                if !rows.is_empty() {
                    Err(RecordError::Conflict("full".into()))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, RecordError::Conflict(msg) if msg == "full"));
        assert_eq!(collection.count(|_| true).unwrap(), 1);
    }
}
