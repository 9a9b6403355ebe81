//! Catalog records
//!
//! The record types themselves live in [`types`]; this module holds what they share: the id
//! type, the [`ModelKind`] discriminant, the [`Entity`] trait the stores are generic over and the
//! tagged [`Model`] variant used wherever a value of any type has to be passed around.
pub mod types;

use core::fmt;
use core::str::FromStr;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use types::{
    Author, AuthorPatch, Library, LibraryPatch, Series, SeriesPatch, Story, StoryPatch, User,
    UserPatch, Volume, VolumePatch,
};

pub type Id = i64;

/// Id carried by drafts that have not been inserted yet
pub const UNSAVED_ID: Id = -1;

/// Discriminant over every record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Author,
    Library,
    Series,
    Story,
    Volume,
    User,
}

impl ModelKind {
    pub const ALL: [Self; 6] = [
        Self::Author,
        Self::Library,
        Self::Series,
        Self::Story,
        Self::Volume,
        Self::User,
    ];

    /// Path segment naming a collection of this type, e.g. `stories`
    #[must_use]
    #[inline]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Author => "authors",
            Self::Library => "libraries",
            Self::Series => "series",
            Self::Story => "stories",
            Self::Volume => "volumes",
            Self::User => "users",
        }
    }

    #[must_use]
    #[inline]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Library => "library",
            Self::Series => "series",
            Self::Story => "story",
            Self::Volume => "volume",
            Self::User => "user",
        }
    }

    /// Whether records of this type are owned by a library
    #[must_use]
    #[inline]
    pub const fn is_child(self) -> bool {
        matches!(self, Self::Author | Self::Series | Self::Story | Self::Volume)
    }
}

impl fmt::Display for ModelKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    /// Accepts both the singular and the plural spelling
    #[inline]
    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.plural() == segment || kind.singular() == segment)
            .ok_or_else(|| format!("Unknown model type '{segment}'"))
    }
}

/// A typed reference to one record: its kind plus its id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub kind: ModelKind,
    pub id: Id,
}

impl Endpoint {
    #[must_use]
    #[inline]
    pub const fn new(kind: ModelKind, id: Id) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for Endpoint {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Id={}", self.kind.singular(), self.id)
    }
}

/// Behaviour shared by every record kept in an [`crate::store::EntityStore`].
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ModelKind;

    /// Partial update merged over a stored record. Patches have no `id` field, and the patches of
    /// library-owned records have no `libraryId`, so neither can be changed by an update.
    type Patch: Clone + fmt::Debug + Default + DeserializeOwned + Send + 'static;

    fn id(&self) -> Id;

    fn set_id(&mut self, id: Id);

    /// Owning library, `None` for top-level records
    #[inline]
    fn library_id(&self) -> Option<Id> {
        None
    }

    fn is_active(&self) -> bool;

    /// Primary name matched by the `name` filter
    fn display_name(&self) -> String;

    /// Key looked up by `exact`
    #[inline]
    fn natural_key(&self) -> String {
        self.display_name()
    }

    /// String the default listing order is based on
    fn sort_key(&self) -> String;

    #[inline]
    fn scope(&self) -> Option<&str> {
        None
    }

    #[inline]
    fn username(&self) -> Option<&str> {
        None
    }

    fn merge(&mut self, patch: Self::Patch);

    fn into_model(self) -> Model;
}

/// Any catalog record, tagged with an explicit `_model` discriminant
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_model", rename_all = "lowercase")]
pub enum Model {
    Author(Author),
    Library(Library),
    Series(Series),
    Story(Story),
    Volume(Volume),
    User(User),
}

impl Model {
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Author(_) => ModelKind::Author,
            Self::Library(_) => ModelKind::Library,
            Self::Series(_) => ModelKind::Series,
            Self::Story(_) => ModelKind::Story,
            Self::Volume(_) => ModelKind::Volume,
            Self::User(_) => ModelKind::User,
        }
    }

    #[must_use]
    #[inline]
    pub fn id(&self) -> Id {
        match self {
            Self::Author(author) => author.id(),
            Self::Library(library) => library.id(),
            Self::Series(series) => series.id(),
            Self::Story(story) => story.id(),
            Self::Volume(volume) => volume.id(),
            Self::User(user) => user.id(),
        }
    }

    #[must_use]
    #[inline]
    pub fn library_id(&self) -> Option<Id> {
        match self {
            Self::Author(author) => author.library_id(),
            Self::Series(series) => series.library_id(),
            Self::Story(story) => story.library_id(),
            Self::Volume(volume) => volume.library_id(),
            Self::Library(_) | Self::User(_) => None,
        }
    }

    /// Short human-readable label, e.g. `story 'The Hobbit'`
    #[must_use]
    #[inline]
    pub fn label(&self) -> String {
        let name = match self {
            Self::Author(author) => author.display_name(),
            Self::Library(library) => library.display_name(),
            Self::Series(series) => series.display_name(),
            Self::Story(story) => story.display_name(),
            Self::Volume(volume) => volume.display_name(),
            Self::User(user) => user.display_name(),
        };
        format!("{} '{name}'", self.kind())
    }

    #[must_use]
    #[inline]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.kind(), self.id())
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
    fn kinds_parse_from_either_spelling() {
        assert_eq!("stories".parse::<ModelKind>(), Ok(ModelKind::Story));
        assert_eq!("story".parse::<ModelKind>(), Ok(ModelKind::Story));
        assert_eq!("series".parse::<ModelKind>(), Ok(ModelKind::Series));
        assert_eq!("libraries".parse::<ModelKind>(), Ok(ModelKind::Library));
        assert!("shelves".parse::<ModelKind>().is_err());
    }

    #[test]
    fn model_is_tagged_with_discriminant() {
        let mut story = Story::new(3, String::from("The Hobbit"));
        story.id = 9;
        let model = story.into_model();

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["_model"], "story");
        assert_eq!(value["libraryId"], 3);

        let back: Model = serde_json::from_value(value).unwrap();
        assert_eq!(back, model);
        assert_eq!(back.kind(), ModelKind::Story);
        assert_eq!(back.endpoint(), Endpoint::new(ModelKind::Story, 9));
        assert_eq!(back.library_id(), Some(3));
        assert_eq!(back.label(), "story 'The Hobbit'");
    }
}
