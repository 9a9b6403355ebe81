//! Seed documents
//!
//! A JSON document describing a whole catalog, used to bootstrap a server or a test. Records
//! may carry explicit ids so that the memberships listed in the same document can refer to them.
use crate::catalog::Catalog;
use crate::error::CatalogResult;
use crate::model::{Author, Endpoint, Id, Library, Series, Story, User, Volume};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Seed {
    pub libraries: Vec<Library>,
    pub users: Vec<User>,
    pub authors: Vec<Author>,
    pub series: Vec<Series>,
    pub stories: Vec<Story>,
    pub volumes: Vec<Volume>,
    pub memberships: Vec<SeedMembership>,
}

/// One membership edge, in the same terms as an include request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeedMembership {
    pub library_id: Id,
    pub child: Endpoint,
    pub other: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<i64>,
}

impl Seed {
    /// # Errors
    /// Fails if the document is not valid JSON or does not describe a seed
    #[inline]
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }
}

impl Catalog {
    /// Inserts every record of `seed`, libraries and users first, then the library-owned
    /// records, then the memberships between them.
    /// # Errors
    /// Stops at the first failing insert or include and returns its error. Records inserted
    /// before the failure stay in the catalog.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
    pub fn load(&mut self, seed: Seed) -> CatalogResult<()> {
        let Seed {
            libraries,
            users,
            authors,
            series,
            stories,
            volumes,
            memberships,
        } = seed;

        for library in libraries {
            self.insert_library(library)?;
        }
        for user in users {
            self.insert_user(user)?;
        }
        for author in authors {
            let library_id = author.library_id;
            self.insert(library_id, author)?;
        }
        for entry in series {
            let library_id = entry.library_id;
            self.insert(library_id, entry)?;
        }
        for story in stories {
            let library_id = story.library_id;
            self.insert(library_id, story)?;
        }
        for volume in volumes {
            let library_id = volume.library_id;
            self.insert(library_id, volume)?;
        }

        let mut created = 0_usize;
        for membership in memberships {
            if self
                .include(
                    membership.library_id,
                    membership.child,
                    membership.other,
                    membership.ordinal,
                )?
            {
                created += 1;
            }
        }
        info!("Seeded catalog with {created} memberships");
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::model::ModelKind;
    use crate::query::Query;
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = r#"{
        "libraries": [{ "id": 10, "name": "Test Lib", "scope": "lib" }],
        "users": [{ "username": "fred", "name": "Fred", "scope": "superuser", "password": "x" }],
        "authors": [{ "id": 3, "libraryId": 10, "firstName": "Fred", "lastName": "Flintstone" }],
        "series": [{ "id": 4, "libraryId": 10, "name": "Bedrock Tales" }],
        "stories": [
            { "id": 5, "libraryId": 10, "name": "The Quarry" },
            { "id": 6, "libraryId": 10, "name": "Dino" }
        ],
        "memberships": [
            { "libraryId": 10, "child": { "kind": "series", "id": 4 }, "other": { "kind": "story", "id": 6 }, "ordinal": 2 },
            { "libraryId": 10, "child": { "kind": "series", "id": 4 }, "other": { "kind": "story", "id": 5 }, "ordinal": 1 }
        ]
    }"#;

    #[test]
    fn loads_records_and_memberships() {
        let mut catalog = Catalog::new();
        catalog.load(Seed::from_json(DOCUMENT).unwrap()).unwrap();

        assert_eq!(catalog.count(ModelKind::Library), 1);
        assert_eq!(catalog.count(ModelKind::User), 1);
        assert_eq!(catalog.count(ModelKind::Story), 2);

        let query = Query::new().via(Endpoint::new(ModelKind::Series, 4));
        let names: Vec<(String, Option<i64>)> = catalog
            .all::<Story>(10, &query)
            .unwrap()
            .into_iter()
            .map(|entry| (entry.entity.name, entry.ordinal))
            .collect();
        assert_eq!(
            names,
            vec![
                (String::from("The Quarry"), Some(1)),
                (String::from("Dino"), Some(2))
            ]
        );
    }

    #[test]
    fn explicit_ids_advance_counters() {
        let mut catalog = Catalog::new();
        catalog.load(Seed::from_json(DOCUMENT).unwrap()).unwrap();
        let story = catalog
            .insert(10, Story::new(10, String::from("Later")))
            .unwrap();
        assert_eq!(story.id, 7);
    }

    #[test]
    fn missing_library_stops_loading() {
        let mut catalog = Catalog::new();
        let seed = Seed::from_json(
            r#"{ "authors": [{ "libraryId": 99, "firstName": "Wilma", "lastName": "Flintstone" }] }"#,
        )
        .unwrap();
        let error = catalog.load(seed).unwrap_err();
        assert_eq!(error.status(), 404);
        assert_eq!(error.context(), "authors.insert(libraryId=99, id=-1)");
    }

    #[test]
    fn empty_document_is_a_valid_seed() {
        assert_eq!(Seed::from_json("{}").unwrap(), Seed::default());
    }
}
