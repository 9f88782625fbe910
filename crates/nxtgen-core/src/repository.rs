//! Storage seam for target entities.
//!
//! Everything above this module reads and writes entities through
//! [`Repository`]. [`InMemoryRepository`] is the only backend today; it keeps
//! insertion order so listings match the order entities were seeded.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{NxtgenError, Result};
use crate::target::Target;

pub trait Repository<T: Target>: Send + Sync {
    fn list(&self) -> Result<Vec<T>>;

    fn get(&self, id: &str) -> Result<T>;

    /// Fails with `TargetExists` if an entity with the same id is present.
    fn insert(&self, item: T) -> Result<()>;

    /// Build an entity from the current contents and store it ahead of
    /// every other entity. Building and storing happen under one write, so
    /// concurrent callers each see the others' entities.
    fn prepend_with(&self, build: &mut dyn FnMut(&[T]) -> T) -> Result<T>;

    /// Apply `f` to a copy of the entity and commit it only if `f` succeeds.
    /// Returns the committed entity.
    fn update(&self, id: &str, f: &mut dyn FnMut(&mut T) -> Result<()>) -> Result<T>;

    fn remove(&self, id: &str) -> Result<T>;

    /// Drop every entity and store `items` in their place.
    fn replace_all(&self, items: Vec<T>) -> Result<()>;
}

#[derive(Debug)]
pub struct InMemoryRepository<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Target> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    // A panic while holding the lock leaves the Vec itself intact, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Target> Repository<T> for InMemoryRepository<T> {
    fn list(&self) -> Result<Vec<T>> {
        Ok(self.read().clone())
    }

    fn get(&self, id: &str) -> Result<T> {
        self.read()
            .iter()
            .find(|t| t.id() == id)
            .cloned()
            .ok_or_else(|| NxtgenError::not_found(T::KIND, id))
    }

    fn insert(&self, item: T) -> Result<()> {
        let mut items = self.write();
        if items.iter().any(|t| t.id() == item.id()) {
            return Err(NxtgenError::TargetExists {
                kind: T::KIND,
                id: item.id().to_string(),
            });
        }
        items.push(item);
        Ok(())
    }

    fn prepend_with(&self, build: &mut dyn FnMut(&[T]) -> T) -> Result<T> {
        let mut items = self.write();
        let item = build(&items);
        if items.iter().any(|t| t.id() == item.id()) {
            return Err(NxtgenError::TargetExists {
                kind: T::KIND,
                id: item.id().to_string(),
            });
        }
        items.insert(0, item.clone());
        Ok(item)
    }

    fn update(&self, id: &str, f: &mut dyn FnMut(&mut T) -> Result<()>) -> Result<T> {
        let mut items = self.write();
        let slot = items
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| NxtgenError::not_found(T::KIND, id))?;
        let mut draft = slot.clone();
        f(&mut draft)?;
        *slot = draft.clone();
        Ok(draft)
    }

    fn remove(&self, id: &str) -> Result<T> {
        let mut items = self.write();
        let pos = items
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| NxtgenError::not_found(T::KIND, id))?;
        Ok(items.remove(pos))
    }

    fn replace_all(&self, items: Vec<T>) -> Result<()> {
        *self.write() = items;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkflowStatus;
    use crate::workflow::Workflow;

    fn repo() -> InMemoryRepository<Workflow> {
        InMemoryRepository::with_items(Workflow::seed())
    }

    #[test]
    fn list_preserves_insertion_order() {
        let r = repo();
        r.insert(Workflow::new("5", "Fifth", "main")).unwrap();
        let ids: Vec<String> = r.list().unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn get_missing_is_not_found() {
        let err = repo().get("99").unwrap_err();
        assert!(matches!(err, NxtgenError::TargetNotFound { .. }));
        assert_eq!(err.to_string(), "workflow not found: 99");
    }

    #[test]
    fn insert_duplicate_is_rejected() {
        let err = repo()
            .insert(Workflow::new("1", "dup", "main"))
            .unwrap_err();
        assert!(matches!(err, NxtgenError::TargetExists { .. }));
    }

    #[test]
    fn prepend_with_sees_current_items() {
        let r = repo();
        let wf = r
            .prepend_with(&mut |items: &[Workflow]| {
                Workflow::new(Workflow::next_id(items), "Newest", "main")
            })
            .unwrap();
        assert_eq!(wf.id, "5");
        let ids: Vec<String> = r.list().unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["5", "1", "2", "3", "4"]);
    }

    #[test]
    fn prepend_with_rejects_duplicate() {
        let err = repo()
            .prepend_with(&mut |_: &[Workflow]| Workflow::new("2", "dup", "main"))
            .unwrap_err();
        assert!(matches!(err, NxtgenError::TargetExists { .. }));
    }

    #[test]
    fn update_commits_on_success() {
        let r = repo();
        let updated = r
            .update("4", &mut |w: &mut Workflow| {
                w.auto_heal = false;
                Ok(())
            })
            .unwrap();
        assert!(!updated.auto_heal);
        assert!(!r.get("4").unwrap().auto_heal);
    }

    #[test]
    fn update_discards_changes_on_error() {
        let r = repo();
        let result = r.update("3", &mut |w: &mut Workflow| {
            w.status = WorkflowStatus::Stopped;
            Err(NxtgenError::InvalidInput("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(r.get("3").unwrap().status, WorkflowStatus::Failed);
    }

    #[test]
    fn remove_returns_entity() {
        let r = repo();
        let removed = r.remove("2").unwrap();
        assert_eq!(removed.name, "Database Migration - PostgreSQL");
        assert_eq!(r.list().unwrap().len(), 3);
        assert!(r.remove("2").is_err());
    }

    #[test]
    fn replace_all_swaps_contents() {
        let r = repo();
        r.replace_all(vec![Workflow::new("42", "Only", "main")]).unwrap();
        let all = r.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "42");
    }
}
