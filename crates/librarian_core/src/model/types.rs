use crate::model::{Entity, Id, Model, ModelKind, UNSAVED_ID};
use crate::sorting::{name_sort, title_sort};
use serde::{Deserialize, Deserializer, Serialize};

const fn unsaved() -> Id {
    UNSAVED_ID
}

const fn default_true() -> bool {
    true
}

/// Patch fields that can be cleared: absent stays `None`, `null` becomes `Some(None)`
fn clearable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    #[serde(default = "unsaved")]
    pub id: Id,
    pub name: String,
    pub scope: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Library {
    #[must_use]
    #[inline]
    pub const fn new(name: String, scope: String) -> Self {
        Self {
            id: UNSAVED_ID,
            name,
            scope,
            active: true,
            notes: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LibraryPatch {
    pub name: Option<String>,
    pub scope: Option<String>,
    pub active: Option<bool>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl Entity for Library {
    const KIND: ModelKind = ModelKind::Library;
    type Patch = LibraryPatch;

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    fn display_name(&self) -> String {
        self.name.clone()
    }

    #[inline]
    fn sort_key(&self) -> String {
        title_sort(&self.name)
    }

    #[inline]
    fn scope(&self) -> Option<&str> {
        Some(&self.scope)
    }

    #[inline]
    fn merge(&mut self, patch: LibraryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(scope) = patch.scope {
            self.scope = scope;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    #[inline]
    fn into_model(self) -> Model {
        Model::Library(self)
    }
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default = "unsaved")]
    pub id: Id,
    #[serde(default = "unsaved")]
    pub library_id: Id,
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Author {
    #[must_use]
    #[inline]
    pub const fn new(library_id: Id, first_name: String, last_name: String) -> Self {
        Self {
            id: UNSAVED_ID,
            library_id,
            first_name,
            last_name,
            active: true,
            notes: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub active: Option<bool>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl Entity for Author {
    const KIND: ModelKind = ModelKind::Author;
    type Patch = AuthorPatch;

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    #[inline]
    fn library_id(&self) -> Option<Id> {
        Some(self.library_id)
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    #[inline]
    fn sort_key(&self) -> String {
        name_sort(&self.first_name, &self.last_name)
    }

    #[inline]
    fn merge(&mut self, patch: AuthorPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    #[inline]
    fn into_model(self) -> Model {
        Model::Author(self)
    }
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    #[serde(default = "unsaved")]
    pub id: Id,
    #[serde(default = "unsaved")]
    pub library_id: Id,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Series {
    #[must_use]
    #[inline]
    pub const fn new(library_id: Id, name: String) -> Self {
        Self {
            id: UNSAVED_ID,
            library_id,
            name,
            active: true,
            copyright: None,
            notes: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SeriesPatch {
    pub name: Option<String>,
    pub active: Option<bool>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub copyright: Option<Option<String>>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl Entity for Series {
    const KIND: ModelKind = ModelKind::Series;
    type Patch = SeriesPatch;

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    #[inline]
    fn library_id(&self) -> Option<Id> {
        Some(self.library_id)
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    fn display_name(&self) -> String {
        self.name.clone()
    }

    #[inline]
    fn sort_key(&self) -> String {
        title_sort(&self.name)
    }

    #[inline]
    fn merge(&mut self, patch: SeriesPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(copyright) = patch.copyright {
            self.copyright = copyright;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    #[inline]
    fn into_model(self) -> Model {
        Model::Series(self)
    }
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(default = "unsaved")]
    pub id: Id,
    #[serde(default = "unsaved")]
    pub library_id: Id,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Story {
    #[must_use]
    #[inline]
    pub const fn new(library_id: Id, name: String) -> Self {
        Self {
            id: UNSAVED_ID,
            library_id,
            name,
            active: true,
            copyright: None,
            notes: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryPatch {
    pub name: Option<String>,
    pub active: Option<bool>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub copyright: Option<Option<String>>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl Entity for Story {
    const KIND: ModelKind = ModelKind::Story;
    type Patch = StoryPatch;

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    #[inline]
    fn library_id(&self) -> Option<Id> {
        Some(self.library_id)
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    fn display_name(&self) -> String {
        self.name.clone()
    }

    #[inline]
    fn sort_key(&self) -> String {
        title_sort(&self.name)
    }

    #[inline]
    fn merge(&mut self, patch: StoryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(copyright) = patch.copyright {
            self.copyright = copyright;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    #[inline]
    fn into_model(self) -> Model {
        Model::Story(self)
    }
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default = "unsaved")]
    pub id: Id,
    #[serde(default = "unsaved")]
    pub library_id: Id,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Kind of volume, e.g. "Single", "Collection" or "Anthology"
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Volume {
    #[must_use]
    #[inline]
    pub const fn new(library_id: Id, name: String) -> Self {
        Self {
            id: UNSAVED_ID,
            library_id,
            name,
            active: true,
            copyright: None,
            isbn: None,
            location: None,
            volume_type: None,
            read: false,
            notes: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumePatch {
    pub name: Option<String>,
    pub active: Option<bool>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub copyright: Option<Option<String>>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub isbn: Option<Option<String>>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<Option<String>>,
    pub read: Option<bool>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl Entity for Volume {
    const KIND: ModelKind = ModelKind::Volume;
    type Patch = VolumePatch;

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    #[inline]
    fn library_id(&self) -> Option<Id> {
        Some(self.library_id)
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    fn display_name(&self) -> String {
        self.name.clone()
    }

    #[inline]
    fn sort_key(&self) -> String {
        title_sort(&self.name)
    }

    #[inline]
    fn merge(&mut self, patch: VolumePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(copyright) = patch.copyright {
            self.copyright = copyright;
        }
        if let Some(isbn) = patch.isbn {
            self.isbn = isbn;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(volume_type) = patch.volume_type {
            self.volume_type = volume_type;
        }
        if let Some(read) = patch.read {
            self.read = read;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    #[inline]
    fn into_model(self) -> Model {
        Model::Volume(self)
    }
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default = "unsaved")]
    pub id: Id,
    pub username: String,
    pub name: String,
    /// Accepted on input, never written back out
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Space separated scope grants, e.g. "superuser" or "lib:admin"
    pub scope: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_books_api_key: Option<String>,
}

impl User {
    #[must_use]
    #[inline]
    pub const fn new(username: String, name: String, scope: String) -> Self {
        Self {
            id: UNSAVED_ID,
            username,
            name,
            password: String::new(),
            scope,
            active: true,
            google_books_api_key: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPatch {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub scope: Option<String>,
    pub active: Option<bool>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub google_books_api_key: Option<Option<String>>,
}

impl Entity for User {
    const KIND: ModelKind = ModelKind::User;
    type Patch = UserPatch;

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    fn display_name(&self) -> String {
        self.name.clone()
    }

    #[inline]
    fn natural_key(&self) -> String {
        self.username.clone()
    }

    /// Users list by username, not by display name like every other record
    #[inline]
    fn sort_key(&self) -> String {
        self.username.clone()
    }

    #[inline]
    fn scope(&self) -> Option<&str> {
        Some(&self.scope)
    }

    #[inline]
    fn username(&self) -> Option<&str> {
        Some(&self.username)
    }

    #[inline]
    fn merge(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(scope) = patch.scope {
            self.scope = scope;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(key) = patch.google_books_api_key {
            self.google_books_api_key = key;
        }
    }

    #[inline]
    fn into_model(self) -> Model {
        Model::User(self)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drafts_deserialize_with_defaults() {
        let author: Author =
            serde_json::from_str(r#"{"firstName": "Fred", "lastName": "Flintstone"}"#).unwrap();
        assert_eq!(author.id, UNSAVED_ID);
        assert_eq!(author.library_id, UNSAVED_ID);
        assert!(author.active);
        assert_eq!(author.notes, None);
    }

    #[test]
    fn merge_ignores_id_and_library_id() {
        let mut author = Author::new(4, String::from("Fred"), String::from("Flintstone"));
        author.id = 12;
        let patch: AuthorPatch =
            serde_json::from_str(r#"{"id": 99, "libraryId": 77, "lastName": "Rubble"}"#).unwrap();

        author.merge(patch);

        assert_eq!(author.id, 12);
        assert_eq!(author.library_id, 4);
        assert_eq!(author.first_name, "Fred");
        assert_eq!(author.last_name, "Rubble");
    }

    #[test]
    fn null_clears_optional_fields() {
        let mut volume = Volume::new(1, String::from("The Hobbit"));
        volume.notes = Some(String::from("shelf 3"));
        volume.isbn = Some(String::from("9780261102217"));
        volume.location = Some(String::from("Study"));
        let patch: VolumePatch =
            serde_json::from_str(r#"{"notes": null, "isbn": null, "read": true}"#).unwrap();

        volume.merge(patch);

        assert_eq!(volume.notes, None);
        assert_eq!(volume.isbn, None);
        assert_eq!(volume.location.as_deref(), Some("Study"));
        assert!(volume.read);
    }

    #[test]
    fn absent_and_null_patch_fields_differ() {
        let absent: UserPatch = serde_json::from_str("{}").unwrap();
        let cleared: UserPatch = serde_json::from_str(r#"{"googleBooksApiKey": null}"#).unwrap();
        let set: UserPatch = serde_json::from_str(r#"{"googleBooksApiKey": "abc"}"#).unwrap();
        assert_eq!(absent.google_books_api_key, None);
        assert_eq!(cleared.google_books_api_key, Some(None));
        assert_eq!(set.google_books_api_key, Some(Some(String::from("abc"))));
    }

    #[test]
    fn volume_type_uses_wire_name() {
        let mut volume = Volume::new(1, String::from("Collected Stories"));
        volume.volume_type = Some(String::from("Collection"));
        let value = serde_json::to_value(&volume).unwrap();
        assert_eq!(value["type"], "Collection");
        assert_eq!(value["read"], false);
        assert!(value.get("isbn").is_none());
    }

    #[test]
    fn password_is_never_serialized() {
        let mut user = User::new(
            String::from("fred"),
            String::from("Fred Flintstone"),
            String::from("superuser"),
        );
        user.password = String::from("yabbadabbadoo");
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["username"], "fred");
    }

    #[test]
    fn author_keys() {
        let author = Author::new(1, String::from("Ursula K."), String::from("Le Guin"));
        assert_eq!(author.display_name(), "Ursula K. Le Guin");
        assert_eq!(author.sort_key(), "Le Guin, Ursula K.");
    }
}
