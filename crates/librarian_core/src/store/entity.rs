use crate::error::{CatalogError, CatalogResult};
use crate::model::{Entity, Id};
use crate::query::Match;
use std::collections::BTreeMap;

/// Records of one type keyed by id.
///
/// Ids handed out by `insert` come from a counter owned by the store; they increase strictly
/// until `reset` and are never shared with another store.
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    entities: BTreeMap<Id, T>,
    next_id: Id,
}

impl<T> Default for EntityStore<T> {
    #[inline]
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn get(&self, id: Id) -> Option<&T> {
        self.entities.get(&id)
    }

    #[must_use]
    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.entities.contains_key(&id)
    }

    /// Every record in id order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entities.values()
    }

    /// Clones of the records passing `matches`, in default listing order
    #[must_use]
    #[inline]
    pub fn all(&self, matches: &Match) -> Vec<T> {
        let mut found: Vec<T> = self
            .iter()
            .filter(|entity| matches.matches(*entity))
            .cloned()
            .collect();
        sort_entities(&mut found);
        found
    }

    /// # Errors
    /// `NotFound` if there is no record with this id
    #[inline]
    pub fn find(&self, id: Id) -> CatalogResult<T> {
        self.get(id)
            .cloned()
            .ok_or_else(|| self.missing(id, &format!("{}.find(id={id})", T::KIND.plural())))
    }

    /// The lowest-id record with natural key `key` among those passing `filter`
    /// # Errors
    /// `NotFound` if no such record exists
    #[inline]
    pub fn exact<F>(&self, key: &str, filter: F) -> CatalogResult<T>
    where
        F: Fn(&T) -> bool,
    {
        self.iter()
            .find(|entity| filter(*entity) && entity.natural_key() == key)
            .cloned()
            .ok_or_else(|| {
                CatalogError::not_found(
                    format!("No {} named '{key}'", T::KIND),
                    format!("{}.exact(key={key})", T::KIND.plural()),
                )
            })
    }

    /// Stores `entity`, assigning the next id when it has none. An explicit id at or above the
    /// counter moves the counter past it, so assigned ids never collide with explicit ones.
    /// # Errors
    /// `NotUnique` if the explicit id is already taken, or if the id space is exhausted (an
    /// explicit `Id::MAX`, or the counter reaching it)
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per insert")]
    pub fn insert(&mut self, mut entity: T) -> CatalogResult<T> {
        let id = entity.id();
        let context = format!("{}.insert(id={id})", T::KIND.plural());
        if id > 0 {
            if self.entities.contains_key(&id) {
                return Err(CatalogError::not_unique(
                    format!("A {} with id {id} already exists", T::KIND),
                    context,
                ));
            }
            if id >= self.next_id {
                self.next_id = id
                    .checked_add(1)
                    .ok_or_else(|| Self::exhausted(&context))?;
            }
        } else {
            let assigned = self.next_id;
            let next = assigned
                .checked_add(1)
                .ok_or_else(|| Self::exhausted(&context))?;
            if self.entities.contains_key(&assigned) {
                return Err(CatalogError::not_unique(
                    format!("A {} with id {assigned} already exists", T::KIND),
                    context,
                ));
            }
            entity.set_id(assigned);
            self.next_id = next;
        }
        self.entities.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    /// Merges `patch` over the stored record and returns the result; the id is untouched
    /// # Errors
    /// `NotFound` if there is no record with this id
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per update")]
    pub fn update(&mut self, id: Id, patch: T::Patch) -> CatalogResult<T> {
        let context = format!("{}.update(id={id})", T::KIND.plural());
        let Some(entity) = self.entities.get_mut(&id) else {
            return Err(self.missing(id, &context));
        };
        entity.merge(patch);
        entity.set_id(id);
        Ok(entity.clone())
    }

    /// # Errors
    /// `NotFound` if there is no record with this id
    #[inline]
    pub fn remove(&mut self, id: Id) -> CatalogResult<T> {
        let context = format!("{}.remove(id={id})", T::KIND.plural());
        self.entities
            .remove(&id)
            .ok_or_else(|| self.missing(id, &context))
    }

    /// Removes every record failing `keep` and returns the ids removed
    #[inline]
    pub fn retain<F>(&mut self, keep: F) -> Vec<Id>
    where
        F: Fn(&T) -> bool,
    {
        let removed: Vec<Id> = self
            .iter()
            .filter(|entity| !keep(*entity))
            .map(Entity::id)
            .collect();
        for id in &removed {
            self.entities.remove(id);
        }
        removed
    }

    /// Drops every record and restarts the id counter
    #[inline]
    pub fn reset(&mut self) {
        self.entities.clear();
        self.next_id = 1;
    }

    fn exhausted(context: &str) -> CatalogError {
        log::warn!("{context}: id space exhausted");
        CatalogError::not_unique(format!("No {} ids left to assign", T::KIND), context)
    }

    fn missing(&self, id: Id, context: &str) -> CatalogError {
        log::debug!("{context}: miss among {} records", self.entities.len());
        CatalogError::not_found(format!("No {} with id {id}", T::KIND), context)
    }
}

/// Sorts by case-folded sort key, ties broken by id
#[inline]
pub fn sort_entities<T: Entity>(entities: &mut [T]) {
    entities.sort_by_cached_key(|entity| (entity.sort_key().to_lowercase(), entity.id()));
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::model::{Library, LibraryPatch, UNSAVED_ID};
    use pretty_assertions::assert_eq;

    fn library(name: &str) -> Library {
        Library::new(name.to_owned(), name.to_lowercase())
    }

    #[test]
    fn assigned_ids_strictly_increase() {
        let mut store = EntityStore::new();
        let mut last = 0;
        for name in ["One", "Two", "Three", "Four"] {
            let inserted = store.insert(library(name)).unwrap();
            assert!(inserted.id > last);
            last = inserted.id;
        }
        store.remove(last).unwrap();
        assert!(store.insert(library("Five")).unwrap().id > last);
    }

    #[test]
    fn explicit_ids_advance_counter() {
        let mut store = EntityStore::new();
        let mut explicit = library("Explicit");
        explicit.id = 10;
        assert_eq!(store.insert(explicit).unwrap().id, 10);
        assert_eq!(store.insert(library("Next")).unwrap().id, 11);

        let mut low = library("Low");
        low.id = 3;
        assert_eq!(store.insert(low).unwrap().id, 3);
        assert_eq!(store.insert(library("After")).unwrap().id, 12);
    }

    #[test]
    fn largest_id_never_overwrites() {
        let mut store = EntityStore::new();
        let mut top = library("Top");
        top.id = Id::MAX;
        assert_eq!(store.insert(top).unwrap_err().status(), 409);
        assert!(store.is_empty());

        let mut below = library("Below");
        below.id = Id::MAX - 1;
        store.insert(below).unwrap();
        let error = store.insert(library("Next")).unwrap_err();
        assert_eq!(error.status(), 409);
        assert_eq!(error.message(), "No library ids left to assign");
        assert_eq!(store.len(), 1);
        assert_eq!(store.find(Id::MAX - 1).unwrap().name, "Below");
    }

    #[test]
    fn colliding_id_is_not_unique() {
        let mut store = EntityStore::new();
        let first = store.insert(library("First")).unwrap();
        let mut second = library("Second");
        second.id = first.id;
        let error = store.insert(second).unwrap_err();
        assert_eq!(error.status(), 409);
        assert_eq!(error.context(), "libraries.insert(id=1)");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insert_then_find_round_trips() {
        let mut store = EntityStore::new();
        let draft = library("Test Lib");
        let inserted = store.insert(draft.clone()).unwrap();
        let found = store.find(inserted.id).unwrap();
        assert_eq!(Library { id: UNSAVED_ID, ..found }, draft);
    }

    #[test]
    fn update_merges_and_keeps_id() {
        let mut store = EntityStore::new();
        let inserted = store.insert(library("Test Lib")).unwrap();
        let patch = LibraryPatch {
            name: Some(String::from("Renamed")),
            ..LibraryPatch::default()
        };
        store.update(inserted.id, patch).unwrap();

        let found = store.find(inserted.id).unwrap();
        assert_eq!(found.id, inserted.id);
        assert_eq!(found.name, "Renamed");
        assert_eq!(found.scope, "test lib");
        assert!(found.active);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut store = EntityStore::<Library>::new();
        assert_eq!(store.find(1).unwrap_err().status(), 404);
        assert_eq!(store.remove(1).unwrap_err().status(), 404);
        assert_eq!(
            store.update(1, LibraryPatch::default()).unwrap_err().message(),
            "No library with id 1"
        );
    }

    #[test]
    fn removed_records_are_not_found() {
        let mut store = EntityStore::new();
        let inserted = store.insert(library("Gone")).unwrap();
        assert_eq!(store.remove(inserted.id).unwrap(), inserted);
        assert!(store.find(inserted.id).is_err());
    }

    #[test]
    fn exact_prefers_lowest_id() {
        let mut store = EntityStore::new();
        let first = store.insert(library("Dup")).unwrap();
        store.insert(library("Dup")).unwrap();
        assert_eq!(store.exact("Dup", |_| true).unwrap().id, first.id);
        assert!(store.exact("dup", |_| true).is_err());
    }

    #[test]
    fn all_orders_by_sort_key() {
        let mut store = EntityStore::new();
        for name in ["The Hobbit", "Neverwhere", "a game", "Dune"] {
            store.insert(library(name)).unwrap();
        }
        let names: Vec<String> = store
            .all(&Match::default())
            .into_iter()
            .map(|found| found.name)
            .collect();
        assert_eq!(names, vec!["a game", "Dune", "The Hobbit", "Neverwhere"]);
    }

    #[test]
    fn reset_restarts_counter() {
        let mut store = EntityStore::new();
        store.insert(library("One")).unwrap();
        store.insert(library("Two")).unwrap();
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.insert(library("Three")).unwrap().id, 1);
    }
}
