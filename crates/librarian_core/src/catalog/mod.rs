//! The catalog
//!
//! One [`Catalog`] value holds every store of a session: libraries and users at the top, the
//! library-owned authors, series, stories and volumes below them, and one membership set per
//! relation. Each instance owns its id counters; use one per test or per server process and
//! call [`Catalog::reset`] to start over.
//!
//! Top-level records (libraries, users) are handled here, library-owned records in
//! [`children`], and the attaching of related collections in [`decorate`].
pub mod children;
pub mod decorate;

pub use decorate::Decorated;

use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    Author, Endpoint, Entity, Id, Library, LibraryPatch, Model, ModelKind, Series, Story, User,
    UserPatch, Volume,
};
use crate::query::Query;
use crate::store::{EntityStore, MembershipSet, Relation};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    libraries: EntityStore<Library>,
    users: EntityStore<User>,
    authors: EntityStore<Author>,
    series: EntityStore<Series>,
    stories: EntityStore<Story>,
    volumes: EntityStore<Volume>,
    memberships: BTreeMap<Relation, MembershipSet>,
}

/// Library-owned record types, together with where a catalog keeps them
pub trait Child: Entity {
    fn set_library_id(&mut self, library_id: Id);

    fn store(catalog: &Catalog) -> &EntityStore<Self>;

    fn store_mut(catalog: &mut Catalog) -> &mut EntityStore<Self>;
}

impl Child for Author {
    #[inline]
    fn set_library_id(&mut self, library_id: Id) {
        self.library_id = library_id;
    }

    #[inline]
    fn store(catalog: &Catalog) -> &EntityStore<Self> {
        &catalog.authors
    }

    #[inline]
    fn store_mut(catalog: &mut Catalog) -> &mut EntityStore<Self> {
        &mut catalog.authors
    }
}

impl Child for Series {
    #[inline]
    fn set_library_id(&mut self, library_id: Id) {
        self.library_id = library_id;
    }

    #[inline]
    fn store(catalog: &Catalog) -> &EntityStore<Self> {
        &catalog.series
    }

    #[inline]
    fn store_mut(catalog: &mut Catalog) -> &mut EntityStore<Self> {
        &mut catalog.series
    }
}

impl Child for Story {
    #[inline]
    fn set_library_id(&mut self, library_id: Id) {
        self.library_id = library_id;
    }

    #[inline]
    fn store(catalog: &Catalog) -> &EntityStore<Self> {
        &catalog.stories
    }

    #[inline]
    fn store_mut(catalog: &mut Catalog) -> &mut EntityStore<Self> {
        &mut catalog.stories
    }
}

impl Child for Volume {
    #[inline]
    fn set_library_id(&mut self, library_id: Id) {
        self.library_id = library_id;
    }

    #[inline]
    fn store(catalog: &Catalog) -> &EntityStore<Self> {
        &catalog.volumes
    }

    #[inline]
    fn store_mut(catalog: &mut Catalog) -> &mut EntityStore<Self> {
        &mut catalog.volumes
    }
}

impl Catalog {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every store and membership set and restarts all id counters
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn reset(&mut self) {
        self.libraries.reset();
        self.users.reset();
        self.authors.reset();
        self.series.reset();
        self.stories.reset();
        self.volumes.reset();
        self.memberships.clear();
        log::info!("Catalog reset");
    }

    /// Number of stored records of `kind`
    #[must_use]
    #[inline]
    pub fn count(&self, kind: ModelKind) -> usize {
        match kind {
            ModelKind::Author => self.authors.len(),
            ModelKind::Library => self.libraries.len(),
            ModelKind::Series => self.series.len(),
            ModelKind::Story => self.stories.len(),
            ModelKind::Volume => self.volumes.len(),
            ModelKind::User => self.users.len(),
        }
    }

    /// Membership edges of `relation`, if any were ever included
    #[must_use]
    #[inline]
    pub fn memberships(&self, relation: Relation) -> Option<&MembershipSet> {
        self.memberships.get(&relation)
    }

    /// Looks up any record by kind and id. With `library_id` set, a library-owned record that
    /// belongs to a different library counts as missing.
    /// # Errors
    /// `NotFound` if the record does not exist (in that library)
    #[allow(clippy::missing_inline_in_public_items, reason = "Large match")]
    pub fn find_model(&self, library_id: Option<Id>, endpoint: Endpoint) -> CatalogResult<Model> {
        let id = endpoint.id;
        let model = match endpoint.kind {
            ModelKind::Author => self.authors.find(id).map(Entity::into_model),
            ModelKind::Library => self.libraries.find(id).map(Entity::into_model),
            ModelKind::Series => self.series.find(id).map(Entity::into_model),
            ModelKind::Story => self.stories.find(id).map(Entity::into_model),
            ModelKind::Volume => self.volumes.find(id).map(Entity::into_model),
            ModelKind::User => self.users.find(id).map(Entity::into_model),
        }?;
        if let (Some(wanted), Some(owner)) = (library_id, model.library_id()) {
            if wanted != owner {
                return Err(CatalogError::not_found(
                    format!("No {} with id {id} in library {wanted}", endpoint.kind),
                    format!("{}.find(libraryId={wanted}, id={id})", endpoint.kind.plural()),
                ));
            }
        }
        Ok(model)
    }

    fn require_library(&self, library_id: Id, context: &str) -> CatalogResult<&Library> {
        self.libraries
            .get(library_id)
            .ok_or_else(|| CatalogError::not_found(format!("No library with id {library_id}"), context))
    }

    #[must_use]
    #[inline]
    pub fn all_libraries(&self, query: &Query) -> Vec<Decorated<Library>> {
        self.libraries
            .all(&query.matches)
            .into_iter()
            .map(|library| self.decorate(Decorated::new(library), query.include))
            .collect()
    }

    /// # Errors
    /// `NotFound` if there is no library with this id
    #[inline]
    pub fn find_library(&self, id: Id, query: &Query) -> CatalogResult<Decorated<Library>> {
        let library = self.libraries.find(id)?;
        Ok(self.decorate(Decorated::new(library), query.include))
    }

    /// # Errors
    /// `NotFound` if there is no library with this name
    #[inline]
    pub fn exact_library(&self, name: &str, query: &Query) -> CatalogResult<Decorated<Library>> {
        let library = self.libraries.exact(name, |_| true)?;
        Ok(self.decorate(Decorated::new(library), query.include))
    }

    /// Stores a library. Names are not checked for uniqueness here; callers validate them with
    /// [`Catalog::exact_library`] first.
    /// # Errors
    /// `NotUnique` if an explicit id is already taken
    #[inline]
    pub fn insert_library(&mut self, library: Library) -> CatalogResult<Library> {
        let inserted = self.libraries.insert(library)?;
        log::debug!("Inserted library {} '{}'", inserted.id, inserted.name);
        Ok(inserted)
    }

    /// # Errors
    /// `NotFound` if there is no library with this id
    #[inline]
    pub fn update_library(&mut self, id: Id, patch: LibraryPatch) -> CatalogResult<Library> {
        self.libraries.update(id, patch)
    }

    /// Removes a library together with everything it owns
    /// # Errors
    /// `NotFound` if there is no library with this id
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn remove_library(&mut self, id: Id) -> CatalogResult<Library> {
        let removed = self.libraries.remove(id)?;
        let owned = self.remove_owned::<Author>(id)
            + self.remove_owned::<Series>(id)
            + self.remove_owned::<Story>(id)
            + self.remove_owned::<Volume>(id);
        log::debug!("Removed library {id} and {owned} owned records");
        Ok(removed)
    }

    #[must_use]
    #[inline]
    pub fn all_users(&self, query: &Query) -> Vec<User> {
        self.users.all(&query.matches)
    }

    /// # Errors
    /// `NotFound` if there is no user with this id
    #[inline]
    pub fn find_user(&self, id: Id) -> CatalogResult<User> {
        self.users.find(id)
    }

    /// # Errors
    /// `NotFound` if there is no user with this username
    #[inline]
    pub fn exact_user(&self, username: &str) -> CatalogResult<User> {
        self.users.exact(username, |_| true)
    }

    /// # Errors
    /// `NotUnique` if an explicit id is already taken
    #[inline]
    pub fn insert_user(&mut self, user: User) -> CatalogResult<User> {
        let inserted = self.users.insert(user)?;
        log::debug!("Inserted user {} '{}'", inserted.id, inserted.username);
        Ok(inserted)
    }

    /// # Errors
    /// `NotFound` if there is no user with this id
    #[inline]
    pub fn update_user(&mut self, id: Id, patch: UserPatch) -> CatalogResult<User> {
        self.users.update(id, patch)
    }

    /// # Errors
    /// `NotFound` if there is no user with this id
    #[inline]
    pub fn remove_user(&mut self, id: Id) -> CatalogResult<User> {
        self.users.remove(id)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::model::UNSAVED_ID;
    use pretty_assertions::assert_eq;

    fn catalog_with_library() -> (Catalog, Library) {
        let mut catalog = Catalog::new();
        let library = catalog
            .insert_library(Library::new(String::from("Test Lib"), String::from("lib")))
            .unwrap();
        (catalog, library)
    }

    #[test]
    fn duplicate_library_names_are_allowed() {
        let mut catalog = Catalog::new();
        let first = catalog
            .insert_library(Library::new(String::from("Dup"), String::from("dup1")))
            .unwrap();
        let second = catalog
            .insert_library(Library::new(String::from("Dup"), String::from("dup2")))
            .unwrap();
        assert!(second.id > first.id);
        assert_eq!(catalog.all_libraries(&Query::new()).len(), 2);
        assert_eq!(
            catalog.exact_library("Dup", &Query::new()).unwrap().entity.id,
            first.id
        );
    }

    #[test]
    fn library_filters_combine() {
        let (mut catalog, _) = catalog_with_library();
        let mut inactive = Library::new(String::from("Test Archive"), String::from("lib"));
        inactive.active = false;
        catalog.insert_library(inactive).unwrap();
        catalog
            .insert_library(Library::new(String::from("Other"), String::from("other")))
            .unwrap();

        let names = |query: &Query| -> Vec<String> {
            catalog
                .all_libraries(query)
                .into_iter()
                .map(|found| found.entity.name)
                .collect()
        };
        assert_eq!(names(&Query::new().name("test")), vec!["Test Archive", "Test Lib"]);
        assert_eq!(names(&Query::new().name("test").active()), vec!["Test Lib"]);
        assert_eq!(names(&Query::new().scope("other")), vec!["Other"]);
    }

    #[test]
    fn find_model_checks_library() {
        let (mut catalog, library) = catalog_with_library();
        let other = catalog
            .insert_library(Library::new(String::from("Other"), String::from("other")))
            .unwrap();
        let story = catalog
            .insert(library.id, Story::new(UNSAVED_ID, String::from("Tale")))
            .unwrap();
        let endpoint = Endpoint::new(ModelKind::Story, story.id);

        assert_eq!(
            catalog.find_model(Some(library.id), endpoint).unwrap(),
            Model::Story(story.clone())
        );
        assert_eq!(catalog.find_model(None, endpoint).unwrap().id(), story.id);
        let error = catalog.find_model(Some(other.id), endpoint).unwrap_err();
        assert_eq!(error.status(), 404);
        assert_eq!(
            catalog
                .find_model(None, Endpoint::new(ModelKind::User, 1))
                .unwrap_err()
                .status(),
            404
        );
    }

    #[test]
    fn users_round_trip() {
        let mut catalog = Catalog::new();
        let draft = User::new(
            String::from("fred"),
            String::from("Fred Flintstone"),
            String::from("superuser"),
        );
        let inserted = catalog.insert_user(draft.clone()).unwrap();
        assert_eq!(User { id: UNSAVED_ID, ..catalog.find_user(inserted.id).unwrap() }, draft);
        assert_eq!(catalog.exact_user("fred").unwrap().id, inserted.id);
        assert!(catalog.all_users(&Query::new().username("barney")).is_empty());

        let patch = UserPatch {
            scope: Some(String::from("lib:admin")),
            ..UserPatch::default()
        };
        assert_eq!(catalog.update_user(inserted.id, patch).unwrap().scope, "lib:admin");
        catalog.remove_user(inserted.id).unwrap();
        assert!(catalog.find_user(inserted.id).is_err());
    }

    #[test]
    fn reset_clears_everything() {
        let (mut catalog, library) = catalog_with_library();
        catalog
            .insert(library.id, Author::new(UNSAVED_ID, String::from("Fred"), String::from("Flintstone")))
            .unwrap();
        catalog.reset();
        for kind in ModelKind::ALL {
            assert_eq!(catalog.count(kind), 0);
        }
        let again = catalog
            .insert_library(Library::new(String::from("Again"), String::from("lib")))
            .unwrap();
        assert_eq!(again.id, 1);
    }
}
