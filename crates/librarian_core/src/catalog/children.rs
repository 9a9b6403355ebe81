//! Library-owned records and the membership edges between them.
//!
//! Every operation names the owning library first and fails with `NotFound` when that library
//! does not exist. A record that exists but belongs to another library is treated as missing.
use crate::catalog::{Catalog, Child, Decorated};
use crate::error::{CatalogError, CatalogResult};
use crate::model::{Endpoint, Entity, Id};
use crate::query::Query;
use crate::store::{Relation, Side};

impl Catalog {
    /// Records of type `T` in the library that pass the query's match predicates. With
    /// `query.via` set, only records joined to that parent across a membership edge are
    /// returned, ordered by ordinal when the parent is a series or volume listing its stories.
    /// # Errors
    /// `NotFound` if the library or the `via` parent does not exist, or if `T` is not related
    /// to the parent's type
    #[allow(clippy::missing_inline_in_public_items, reason = "Large function")]
    pub fn all<T: Child>(&self, library_id: Id, query: &Query) -> CatalogResult<Vec<Decorated<T>>> {
        let context = format!("{}.all(libraryId={library_id})", T::KIND.plural());
        self.require_library(library_id, &context)?;

        let entries: Vec<Decorated<T>> = match query.via {
            None => T::store(self)
                .all(&query.matches)
                .into_iter()
                .filter(|entity| entity.library_id() == Some(library_id))
                .map(Decorated::new)
                .collect(),
            Some(via) => {
                let context = format!("{}.all(libraryId={library_id}, {via})", T::KIND.plural());
                self.find_model(Some(library_id), via)
                    .map_err(|err| err.with_context(&context))?;
                let related = self.related::<T>(via).ok_or_else(|| {
                    CatalogError::not_found(
                        format!("A {} has no related {}", via.kind, T::KIND.plural()),
                        &context,
                    )
                })?;
                related
                    .into_iter()
                    .filter(|entry| {
                        entry.entity.library_id() == Some(library_id)
                            && query.matches(&entry.entity)
                    })
                    .collect()
            }
        };

        Ok(entries
            .into_iter()
            .map(|entry| self.decorate(entry, query.include))
            .collect())
    }

    /// # Errors
    /// `NotFound` if the library or the record does not exist
    #[inline]
    pub fn find<T: Child>(&self, library_id: Id, id: Id, query: &Query) -> CatalogResult<Decorated<T>> {
        let context = format!("{}.find(libraryId={library_id}, id={id})", T::KIND.plural());
        let entity = self.owned::<T>(library_id, id, &context)?;
        Ok(self.decorate(Decorated::new(entity), query.include))
    }

    /// The record of type `T` in the library whose natural key equals `key`
    /// # Errors
    /// `NotFound` if the library or a matching record does not exist
    #[inline]
    pub fn exact<T: Child>(&self, library_id: Id, key: &str, query: &Query) -> CatalogResult<Decorated<T>> {
        let context = format!("{}.exact(libraryId={library_id}, key={key})", T::KIND.plural());
        self.require_library(library_id, &context)?;
        let entity = T::store(self)
            .exact(key, |entity| entity.library_id() == Some(library_id))
            .map_err(|err| err.with_context(&context))?;
        Ok(self.decorate(Decorated::new(entity), query.include))
    }

    /// Stores `entity` in the library. Its `libraryId` is overwritten with `library_id`.
    /// # Errors
    /// `NotFound` if the library does not exist, `NotUnique` if an explicit id is taken
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per insert")]
    pub fn insert<T: Child>(&mut self, library_id: Id, mut entity: T) -> CatalogResult<T> {
        let context = format!(
            "{}.insert(libraryId={library_id}, id={})",
            T::KIND.plural(),
            entity.id()
        );
        self.require_library(library_id, &context)?;
        entity.set_library_id(library_id);
        let inserted = T::store_mut(self)
            .insert(entity)
            .map_err(|err| err.with_context(&context))?;
        log::debug!(
            "Inserted {} {} '{}' into library {library_id}",
            T::KIND,
            inserted.id(),
            inserted.display_name()
        );
        Ok(inserted)
    }

    /// Merges `patch` over the stored record; neither its id nor its library change
    /// # Errors
    /// `NotFound` if the library or the record does not exist
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per update")]
    pub fn update<T: Child>(&mut self, library_id: Id, id: Id, patch: T::Patch) -> CatalogResult<T> {
        let context = format!("{}.update(libraryId={library_id}, id={id})", T::KIND.plural());
        self.owned::<T>(library_id, id, &context)?;
        T::store_mut(self)
            .update(id, patch)
            .map_err(|err| err.with_context(&context))
    }

    /// Removes the record and every membership edge it takes part in
    /// # Errors
    /// `NotFound` if the library or the record does not exist
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per removal")]
    pub fn remove<T: Child>(&mut self, library_id: Id, id: Id) -> CatalogResult<T> {
        let context = format!("{}.remove(libraryId={library_id}, id={id})", T::KIND.plural());
        self.owned::<T>(library_id, id, &context)?;
        let removed = T::store_mut(self)
            .remove(id)
            .map_err(|err| err.with_context(&context))?;
        let edges = self.purge_edges(Endpoint::new(T::KIND, id));
        log::debug!("Removed {} {id} and {edges} membership edges", T::KIND);
        Ok(removed)
    }

    /// Creates the membership edge between `child` and `other`, two records of related types in
    /// the same library. The ordinal is kept only for series/story and volume/story edges.
    /// Including a pair that is already a member changes nothing. Returns whether an edge was
    /// created.
    /// # Errors
    /// `NotFound` if the library or either record does not exist, or if the two types have no
    /// relation
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per include")]
    pub fn include(
        &mut self,
        library_id: Id,
        child: Endpoint,
        other: Endpoint,
        ordinal: Option<i64>,
    ) -> CatalogResult<bool> {
        let context = format!(
            "{}.include(libraryId={library_id}, {child}, {other})",
            child.kind.plural()
        );
        let (relation, (left, right)) = self.edge_between(library_id, child, other, &context)?;
        let ordinal = ordinal.filter(|_| relation.is_ordered());
        let created = self
            .memberships
            .entry(relation)
            .or_default()
            .include(left, right, ordinal);
        log::debug!("{context}: ordinal={ordinal:?} created={created}");
        Ok(created)
    }

    /// Deletes the membership edge between `child` and `other` if there is one. Returns whether
    /// an edge was deleted.
    /// # Errors
    /// `NotFound` if the library or either record does not exist, or if the two types have no
    /// relation
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per exclude")]
    pub fn exclude(&mut self, library_id: Id, child: Endpoint, other: Endpoint) -> CatalogResult<bool> {
        let context = format!(
            "{}.exclude(libraryId={library_id}, {child}, {other})",
            child.kind.plural()
        );
        let (relation, (left, right)) = self.edge_between(library_id, child, other, &context)?;
        let removed = self
            .memberships
            .get_mut(&relation)
            .is_some_and(|set| set.exclude(left, right));
        log::debug!("{context}: removed={removed}");
        Ok(removed)
    }

    /// Checks both records and resolves the relation and the `(left, right)` ids of their edge
    fn edge_between(
        &self,
        library_id: Id,
        child: Endpoint,
        other: Endpoint,
        context: &str,
    ) -> CatalogResult<(Relation, (Id, Id))> {
        self.require_library(library_id, context)?;
        let (relation, side) = Relation::between(child.kind, other.kind).ok_or_else(|| {
            CatalogError::not_found(
                format!("A {} cannot include {}", child.kind, other.kind.plural()),
                context,
            )
        })?;
        for endpoint in [child, other] {
            self.find_model(Some(library_id), endpoint)
                .map_err(|err| err.with_context(context))?;
        }
        Ok((relation, side.orient(child.id, other.id)))
    }

    /// The record, provided it belongs to the library
    fn owned<T: Child>(&self, library_id: Id, id: Id, context: &str) -> CatalogResult<T> {
        self.require_library(library_id, context)?;
        let entity = T::store(self)
            .find(id)
            .map_err(|err| err.with_context(context))?;
        if entity.library_id() != Some(library_id) {
            return Err(CatalogError::not_found(
                format!("No {} with id {id} in library {library_id}", T::KIND),
                context,
            ));
        }
        Ok(entity)
    }

    /// Drops every edge touching `endpoint`; returns how many were dropped
    pub(crate) fn purge_edges(&mut self, endpoint: Endpoint) -> usize {
        let mut purged = 0;
        for (relation, set) in &mut self.memberships {
            let (left, right) = relation.sides();
            if left == endpoint.kind {
                purged += set.purge(Side::Left, endpoint.id);
            }
            if right == endpoint.kind {
                purged += set.purge(Side::Right, endpoint.id);
            }
        }
        purged
    }

    /// Removes every `T` owned by the library, with their edges; returns how many were removed
    pub(crate) fn remove_owned<T: Child>(&mut self, library_id: Id) -> usize {
        let removed = T::store_mut(self).retain(|entity| entity.library_id() != Some(library_id));
        for id in &removed {
            self.purge_edges(Endpoint::new(T::KIND, *id));
        }
        removed.len()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::model::{Author, AuthorPatch, Library, ModelKind, Series, Story, UNSAVED_ID, Volume};
    use crate::query::Query;
    use pretty_assertions::assert_eq;

    struct Fixture {
        catalog: Catalog,
        library: Id,
    }

    impl Fixture {
        fn new() -> Self {
            let mut catalog = Catalog::new();
            let library = catalog
                .insert_library(Library::new(String::from("Test Lib"), String::from("lib")))
                .unwrap()
                .id;
            Self { catalog, library }
        }

        fn author(&mut self, first: &str, last: &str) -> Author {
            self.catalog
                .insert(
                    self.library,
                    Author::new(UNSAVED_ID, first.to_owned(), last.to_owned()),
                )
                .unwrap()
        }

        fn series(&mut self, name: &str) -> Series {
            self.catalog
                .insert(self.library, Series::new(UNSAVED_ID, name.to_owned()))
                .unwrap()
        }

        fn story(&mut self, name: &str) -> Story {
            self.catalog
                .insert(self.library, Story::new(UNSAVED_ID, name.to_owned()))
                .unwrap()
        }

        fn volume(&mut self, name: &str) -> Volume {
            self.catalog
                .insert(self.library, Volume::new(UNSAVED_ID, name.to_owned()))
                .unwrap()
        }
    }

    fn endpoint<T: Entity>(entity: &T) -> Endpoint {
        Endpoint::new(T::KIND, entity.id())
    }

    #[test]
    fn fred_flintstone_is_listed() {
        let mut fixture = Fixture::new();
        let fred = fixture.author("Fred", "Flintstone");
        assert_eq!(fred.library_id, fixture.library);

        let authors = fixture
            .catalog
            .all::<Author>(fixture.library, &Query::new())
            .unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].entity.display_name(), "Fred Flintstone");
    }

    #[test]
    fn missing_library_is_not_found() {
        let mut fixture = Fixture::new();
        let missing = fixture.library + 1;
        let error = fixture
            .catalog
            .insert(missing, Author::new(UNSAVED_ID, String::from("A"), String::from("B")))
            .unwrap_err();
        assert_eq!(error.status(), 404);
        assert_eq!(error.message(), format!("No library with id {missing}"));
        assert!(fixture.catalog.all::<Author>(missing, &Query::new()).is_err());
        assert!(
            fixture
                .catalog
                .update::<Author>(missing, 1, AuthorPatch::default())
                .is_err()
        );
        assert!(fixture.catalog.remove::<Author>(missing, 1).is_err());
    }

    #[test]
    fn insert_forces_library_id() {
        let mut fixture = Fixture::new();
        let author = fixture
            .catalog
            .insert(
                fixture.library,
                Author::new(42, String::from("Wilma"), String::from("Flintstone")),
            )
            .unwrap();
        assert_eq!(author.library_id, fixture.library);
    }

    #[test]
    fn records_of_other_libraries_are_hidden() {
        let mut fixture = Fixture::new();
        let story = fixture.story("Tale");
        let other = fixture
            .catalog
            .insert_library(Library::new(String::from("Other"), String::from("other")))
            .unwrap()
            .id;

        assert!(fixture.catalog.find::<Story>(other, story.id, &Query::new()).is_err());
        assert!(fixture.catalog.remove::<Story>(other, story.id).is_err());
        assert!(
            fixture
                .catalog
                .all::<Story>(other, &Query::new())
                .unwrap()
                .is_empty()
        );
        assert!(
            fixture
                .catalog
                .find::<Story>(fixture.library, story.id, &Query::new())
                .is_ok()
        );
    }

    #[test]
    fn update_then_find_merges_fields() {
        let mut fixture = Fixture::new();
        let fred = fixture.author("Fred", "Flintstone");
        let patch = AuthorPatch {
            first_name: Some(String::from("Frederick")),
            active: Some(false),
            ..AuthorPatch::default()
        };
        fixture
            .catalog
            .update::<Author>(fixture.library, fred.id, patch)
            .unwrap();

        let found = fixture
            .catalog
            .find::<Author>(fixture.library, fred.id, &Query::new())
            .unwrap()
            .entity;
        assert_eq!(found.id, fred.id);
        assert_eq!(found.first_name, "Frederick");
        assert_eq!(found.last_name, "Flintstone");
        assert!(!found.active);
    }

    #[test]
    fn exact_is_scoped_to_library() {
        let mut fixture = Fixture::new();
        let fred = fixture.author("Fred", "Flintstone");
        let found = fixture
            .catalog
            .exact::<Author>(fixture.library, "Fred Flintstone", &Query::new())
            .unwrap();
        assert_eq!(found.entity.id, fred.id);

        let other = fixture
            .catalog
            .insert_library(Library::new(String::from("Other"), String::from("other")))
            .unwrap()
            .id;
        let error = fixture
            .catalog
            .exact::<Author>(other, "Fred Flintstone", &Query::new())
            .unwrap_err();
        assert_eq!(error.status(), 404);
        assert_eq!(error.context(), format!("authors.exact(libraryId={other}, key=Fred Flintstone)"));
    }

    #[test]
    fn include_is_idempotent() {
        let mut fixture = Fixture::new();
        let author = fixture.author("Fred", "Flintstone");
        let story = fixture.story("Tale");
        let (a, s) = (endpoint(&author), endpoint(&story));

        assert!(fixture.catalog.include(fixture.library, a, s, None).unwrap());
        assert!(!fixture.catalog.include(fixture.library, a, s, None).unwrap());
        // The reverse direction names the same pair
        assert!(!fixture.catalog.include(fixture.library, s, a, None).unwrap());
        assert_eq!(
            fixture.catalog.memberships(Relation::AuthorStory).map(|set| set.len()),
            Some(1)
        );
    }

    #[test]
    fn exclude_of_non_member_changes_nothing() {
        let mut fixture = Fixture::new();
        let author = fixture.author("Fred", "Flintstone");
        let story = fixture.story("Tale");
        let other = fixture.story("Other Tale");
        let (a, s, o) = (endpoint(&author), endpoint(&story), endpoint(&other));

        assert!(!fixture.catalog.exclude(fixture.library, a, s).unwrap());
        assert!(fixture.catalog.memberships(Relation::AuthorStory).is_none());

        fixture.catalog.include(fixture.library, a, o, None).unwrap();
        assert!(!fixture.catalog.exclude(fixture.library, a, s).unwrap());
        assert_eq!(
            fixture.catalog.memberships(Relation::AuthorStory).map(|set| set.len()),
            Some(1)
        );
        assert!(fixture.catalog.exclude(fixture.library, o, a).unwrap());
    }

    #[test]
    fn include_requires_both_records() {
        let mut fixture = Fixture::new();
        let author = fixture.author("Fred", "Flintstone");
        let ghost = Endpoint::new(ModelKind::Story, 99);

        let error = fixture
            .catalog
            .include(fixture.library, endpoint(&author), ghost, None)
            .unwrap_err();
        assert_eq!(error.status(), 404);
        assert_eq!(error.message(), "No story with id 99");
        assert!(
            fixture
                .catalog
                .exclude(fixture.library, endpoint(&author), ghost)
                .is_err()
        );
    }

    #[test]
    fn unrelated_types_cannot_include() {
        let mut fixture = Fixture::new();
        let series = fixture.series("Saga");
        let volume = fixture.volume("Omnibus");
        let error = fixture
            .catalog
            .include(fixture.library, endpoint(&series), endpoint(&volume), None)
            .unwrap_err();
        assert_eq!(error.message(), "A series cannot include volumes");
    }

    #[test]
    fn ordinal_only_kept_for_ordered_relations() {
        let mut fixture = Fixture::new();
        let author = fixture.author("Fred", "Flintstone");
        let series = fixture.series("Saga");
        let story = fixture.story("Tale");

        fixture
            .catalog
            .include(fixture.library, endpoint(&author), endpoint(&series), Some(5))
            .unwrap();
        fixture
            .catalog
            .include(fixture.library, endpoint(&story), endpoint(&series), Some(5))
            .unwrap();

        let author_edge = fixture
            .catalog
            .memberships(Relation::AuthorSeries)
            .and_then(|set| set.get(author.id, series.id).copied());
        assert_eq!(author_edge.map(|edge| edge.ordinal), Some(None));
        let story_edge = fixture
            .catalog
            .memberships(Relation::SeriesStory)
            .and_then(|set| set.get(series.id, story.id).copied());
        assert_eq!(story_edge.map(|edge| edge.ordinal), Some(Some(5)));
    }

    #[test]
    fn series_lists_stories_by_ordinal() {
        let mut fixture = Fixture::new();
        let series = fixture.series("Saga");
        for (name, ordinal) in [("Third", Some(3)), ("First", Some(1)), ("Loose", None), ("Second", Some(2))] {
            let story = fixture.story(name);
            fixture
                .catalog
                .include(fixture.library, endpoint(&series), endpoint(&story), ordinal)
                .unwrap();
        }

        let query = Query::new().via(endpoint(&series));
        let stories = fixture.catalog.all::<Story>(fixture.library, &query).unwrap();
        let listed: Vec<(String, Option<i64>)> = stories
            .into_iter()
            .map(|entry| (entry.entity.name, entry.ordinal))
            .collect();
        assert_eq!(
            listed,
            vec![
                (String::from("First"), Some(1)),
                (String::from("Second"), Some(2)),
                (String::from("Third"), Some(3)),
                (String::from("Loose"), None),
            ]
        );
    }

    #[test]
    fn volume_lists_stories_by_ordinal() {
        let mut fixture = Fixture::new();
        let volume = fixture.volume("Collected Tales");
        for (name, ordinal) in [("Third", Some(3)), ("First", Some(1)), ("Loose", None), ("Second", Some(2))] {
            let story = fixture.story(name);
            fixture
                .catalog
                .include(fixture.library, endpoint(&volume), endpoint(&story), ordinal)
                .unwrap();
        }
        let expected = vec![Some(1), Some(2), Some(3), None];

        let query = Query::new().via(endpoint(&volume));
        let listed: Vec<Option<i64>> = fixture
            .catalog
            .all::<Story>(fixture.library, &query)
            .unwrap()
            .into_iter()
            .map(|entry| entry.ordinal)
            .collect();
        assert_eq!(listed, expected);

        let query = Query::new().with(ModelKind::Story);
        let found = fixture
            .catalog
            .find::<Volume>(fixture.library, volume.id, &query)
            .unwrap();
        let decorated: Vec<Option<i64>> = found
            .stories
            .unwrap()
            .into_iter()
            .map(|entry| entry.ordinal)
            .collect();
        assert_eq!(decorated, expected);
    }

    #[test]
    fn shared_ordinal_keeps_insertion_order() {
        let mut fixture = Fixture::new();
        let volume = fixture.volume("Collected Tales");
        for (name, ordinal) in [("Zeta", Some(2)), ("Alpha", Some(2)), ("Opening", Some(1))] {
            let story = fixture.story(name);
            fixture
                .catalog
                .include(fixture.library, endpoint(&volume), endpoint(&story), ordinal)
                .unwrap();
        }

        let query = Query::new().via(endpoint(&volume));
        let names: Vec<String> = fixture
            .catalog
            .all::<Story>(fixture.library, &query)
            .unwrap()
            .into_iter()
            .map(|entry| entry.entity.name)
            .collect();
        assert_eq!(names, vec!["Opening", "Zeta", "Alpha"]);
    }

    #[test]
    fn via_listing_joins_membership() {
        let mut fixture = Fixture::new();
        let fred = fixture.author("Fred", "Flintstone");
        let barney = fixture.author("Barney", "Rubble");
        let quarry = fixture.story("The Quarry");
        let bowling = fixture.story("Bowling Night");
        let picnic = fixture.story("Picnic");
        for story in [&quarry, &bowling] {
            fixture
                .catalog
                .include(fixture.library, endpoint(&fred), endpoint(story), None)
                .unwrap();
        }
        fixture
            .catalog
            .include(fixture.library, endpoint(&picnic), endpoint(&barney), None)
            .unwrap();

        let names = |catalog: &Catalog, query: &Query| -> Vec<String> {
            catalog
                .all::<Story>(fixture.library, query)
                .unwrap()
                .into_iter()
                .map(|entry| entry.entity.name)
                .collect()
        };
        assert_eq!(
            names(&fixture.catalog, &Query::new().via(endpoint(&fred))),
            vec!["Bowling Night", "The Quarry"]
        );
        assert_eq!(
            names(&fixture.catalog, &Query::new().via(endpoint(&fred)).name("quarry")),
            vec!["The Quarry"]
        );
        assert_eq!(
            names(&fixture.catalog, &Query::new().via(endpoint(&barney))),
            vec!["Picnic"]
        );
        assert_eq!(names(&fixture.catalog, &Query::new()).len(), 3);

        let error = fixture
            .catalog
            .all::<Story>(fixture.library, &Query::new().via(Endpoint::new(ModelKind::Author, 77)))
            .unwrap_err();
        assert_eq!(error.status(), 404);
    }

    #[test]
    fn removal_drops_edges() {
        let mut fixture = Fixture::new();
        let author = fixture.author("Fred", "Flintstone");
        let story = fixture.story("Tale");
        fixture
            .catalog
            .include(fixture.library, endpoint(&author), endpoint(&story), None)
            .unwrap();

        fixture.catalog.remove::<Story>(fixture.library, story.id).unwrap();
        assert!(
            fixture
                .catalog
                .find::<Story>(fixture.library, story.id, &Query::new())
                .is_err()
        );
        assert_eq!(
            fixture.catalog.memberships(Relation::AuthorStory).map(|set| set.len()),
            Some(0)
        );
    }

    #[test]
    fn removing_library_cascades() {
        let mut fixture = Fixture::new();
        let author = fixture.author("Fred", "Flintstone");
        let story = fixture.story("Tale");
        fixture
            .catalog
            .include(fixture.library, endpoint(&author), endpoint(&story), None)
            .unwrap();

        fixture.catalog.remove_library(fixture.library).unwrap();
        assert_eq!(fixture.catalog.count(ModelKind::Author), 0);
        assert_eq!(fixture.catalog.count(ModelKind::Story), 0);
        assert_eq!(
            fixture.catalog.memberships(Relation::AuthorStory).map(|set| set.len()),
            Some(0)
        );
    }
}
