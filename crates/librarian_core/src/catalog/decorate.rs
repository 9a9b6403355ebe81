use crate::catalog::{Catalog, Child};
use crate::model::{Author, Endpoint, Entity, Library, ModelKind, Series, Story, Volume};
use crate::query::Include;
use crate::store::entity::sort_entities;
use crate::store::{Relation, Side, sort_by_ordinal};
use serde::Serialize;

/// A record together with the related collections an [`Include`] asked for.
///
/// Serializes as the record's own fields plus one attribute per requested collection. Attributes
/// that were not requested, or make no sense for the record's type, are left out entirely.
/// Entries listed through a series/story or volume/story edge also carry that edge's `ordinal`.
#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Decorated<T> {
    #[serde(flatten)]
    pub entity: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<Decorated<Author>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<Decorated<Series>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<Vec<Decorated<Story>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Decorated<Volume>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<Library>,
}

impl<T> Decorated<T> {
    #[must_use]
    #[inline]
    pub const fn new(entity: T) -> Self {
        Self::with_ordinal(entity, None)
    }

    #[must_use]
    #[inline]
    pub const fn with_ordinal(entity: T, ordinal: Option<i64>) -> Self {
        Self {
            entity,
            ordinal,
            authors: None,
            series: None,
            stories: None,
            volumes: None,
            library: None,
        }
    }

    #[must_use]
    #[inline]
    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl Catalog {
    /// Attaches the collections requested by `include`. Works on the clone it is handed; the
    /// stored records are never touched.
    pub(crate) fn decorate<T: Entity>(
        &self,
        mut decorated: Decorated<T>,
        include: Include,
    ) -> Decorated<T> {
        if !include.any() {
            return decorated;
        }
        let owner = Endpoint::new(T::KIND, decorated.entity.id());
        if include.wants(ModelKind::Author) {
            decorated.authors = self.related::<Author>(owner);
        }
        if include.wants(ModelKind::Series) {
            decorated.series = self.related::<Series>(owner);
        }
        if include.wants(ModelKind::Story) {
            decorated.stories = self.related::<Story>(owner);
        }
        if include.wants(ModelKind::Volume) {
            decorated.volumes = self.related::<Volume>(owner);
        }
        if include.wants(ModelKind::Library) {
            decorated.library = decorated
                .entity
                .library_id()
                .and_then(|library_id| self.libraries.get(library_id).cloned());
        }
        decorated
    }

    /// Records of type `T` related to `owner`: the records a library owns, or the partners of a
    /// record across a membership relation. `None` when the two types are not related at all.
    ///
    /// Stories listed from their series or volume come in ordinal order; every other list comes
    /// in default listing order.
    pub(crate) fn related<T: Child>(&self, owner: Endpoint) -> Option<Vec<Decorated<T>>> {
        let store = T::store(self);
        if owner.kind == ModelKind::Library {
            let mut owned: Vec<T> = store
                .iter()
                .filter(|entity| entity.library_id() == Some(owner.id))
                .cloned()
                .collect();
            sort_entities(&mut owned);
            return Some(owned.into_iter().map(Decorated::new).collect());
        }

        let (relation, side) = Relation::between(owner.kind, T::KIND)?;
        let mut partners = self
            .memberships
            .get(&relation)
            .map(|set| set.partners(side, owner.id))
            .unwrap_or_default();
        let by_ordinal = relation.is_ordered() && side == Side::Left;
        if by_ordinal {
            sort_by_ordinal(&mut partners);
        }

        let mut entries: Vec<Decorated<T>> = partners
            .into_iter()
            .filter_map(|(id, ordinal)| {
                store
                    .get(id)
                    .cloned()
                    .map(|entity| Decorated::with_ordinal(entity, ordinal))
            })
            .collect();
        if !by_ordinal {
            entries.sort_by_cached_key(|entry| {
                (entry.entity.sort_key().to_lowercase(), entry.entity.id())
            });
        }
        Some(entries)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::model::{Id, UNSAVED_ID};
    use crate::query::Query;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn seeded() -> (Catalog, Id, Series, Story) {
        let mut catalog = Catalog::new();
        let library = catalog
            .insert_library(Library::new(String::from("Test Lib"), String::from("lib")))
            .unwrap()
            .id;
        let author = catalog
            .insert(
                library,
                Author::new(UNSAVED_ID, String::from("Fred"), String::from("Flintstone")),
            )
            .unwrap();
        let series = catalog
            .insert(library, Series::new(UNSAVED_ID, String::from("Bedrock Tales")))
            .unwrap();
        let story = catalog
            .insert(library, Story::new(UNSAVED_ID, String::from("The Quarry")))
            .unwrap();
        let series_endpoint = Endpoint::new(ModelKind::Series, series.id);
        let story_endpoint = Endpoint::new(ModelKind::Story, story.id);
        catalog
            .include(library, series_endpoint, story_endpoint, Some(2))
            .unwrap();
        catalog
            .include(
                library,
                Endpoint::new(ModelKind::Author, author.id),
                story_endpoint,
                None,
            )
            .unwrap();
        (catalog, library, series, story)
    }

    #[test]
    fn undecorated_when_nothing_requested() {
        let (catalog, library, _, story) = seeded();
        let found = catalog.find::<Story>(library, story.id, &Query::new()).unwrap();
        assert_eq!(found, Decorated::new(story));
    }

    #[test]
    fn story_with_everything() {
        let (catalog, library, series, story) = seeded();
        let query = Query::new()
            .with(ModelKind::Author)
            .with(ModelKind::Series)
            .with(ModelKind::Volume)
            .with(ModelKind::Library);
        let found = catalog.find::<Story>(library, story.id, &query).unwrap();

        let value = serde_json::to_value(&found).unwrap();
        assert_eq!(
            value,
            json!({
                "id": story.id,
                "libraryId": library,
                "name": "The Quarry",
                "active": true,
                "authors": [
                    {"id": 1, "libraryId": library, "firstName": "Fred", "lastName": "Flintstone", "active": true}
                ],
                "series": [
                    {"id": series.id, "libraryId": library, "name": "Bedrock Tales", "active": true, "ordinal": 2}
                ],
                "volumes": [],
                "library": {"id": library, "name": "Test Lib", "scope": "lib", "active": true}
            })
        );
    }

    #[test]
    fn meaningless_includes_are_omitted() {
        let (catalog, library, series, _) = seeded();
        let query = Query::new().with(ModelKind::Volume).with(ModelKind::Story);
        let found = catalog.find::<Series>(library, series.id, &query).unwrap();
        assert_eq!(found.volumes, None);
        assert_eq!(found.stories.map(|stories| stories.len()), Some(1));

        let found = catalog
            .find_library(library, &Query::new().with(ModelKind::Library))
            .unwrap();
        assert_eq!(found.library, None);
    }

    #[test]
    fn library_includes_owned_records() {
        let (catalog, library, _, _) = seeded();
        let found = catalog
            .find_library(library, &Query::new().with(ModelKind::Author).with(ModelKind::Story))
            .unwrap();
        let authors: Vec<String> = found
            .authors
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.entity.display_name())
            .collect();
        assert_eq!(authors, vec!["Fred Flintstone"]);
        assert_eq!(found.stories.map(|stories| stories.len()), Some(1));
        assert_eq!(found.series, None);
    }

    #[test]
    fn decoration_leaves_store_untouched() {
        let (catalog, library, series, _) = seeded();
        let before = catalog.clone();
        let _decorated = catalog
            .find::<Series>(library, series.id, &Query::new().with(ModelKind::Story))
            .unwrap();
        assert_eq!(
            catalog.find::<Series>(library, series.id, &Query::new()).unwrap(),
            before.find::<Series>(library, series.id, &Query::new()).unwrap()
        );
    }
}
