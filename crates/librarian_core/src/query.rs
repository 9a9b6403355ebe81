//! Query decoration
//!
//! A flat set of key/value parameters, as found in a URL query string, split into match
//! predicates (which records are returned) and include directives (which related collections
//! are attached to each returned record). Boolean parameters follow the presence convention:
//! `?active=` means true, an absent key means false, and the value is ignored.
use crate::model::{Endpoint, Entity, ModelKind};
use urlencoding::encode;

pub const ACTIVE: &str = "active";
pub const NAME: &str = "name";
pub const SCOPE: &str = "scope";
pub const USERNAME: &str = "username";
pub const WITH_AUTHORS: &str = "withAuthors";
pub const WITH_SERIES: &str = "withSeries";
pub const WITH_STORIES: &str = "withStories";
pub const WITH_VOLUMES: &str = "withVolumes";
pub const WITH_LIBRARY: &str = "withLibrary";

/// Predicates combined with logical AND. An unset predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    pub active: bool,
    /// Case-insensitive substring of the primary name
    pub name: Option<String>,
    /// Exact scope, only checked for records that have one
    pub scope: Option<String>,
    /// Exact username, only checked for users
    pub username: Option<String>,
}

impl Match {
    #[must_use]
    #[inline]
    pub fn matches<T: Entity>(&self, entity: &T) -> bool {
        if self.active && !entity.is_active() {
            return false;
        }
        if let Some(name) = &self.name {
            let needle = name.to_lowercase();
            if !entity.display_name().to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let (Some(wanted), Some(scope)) = (&self.scope, entity.scope()) {
            if wanted != scope {
                return false;
            }
        }
        if let (Some(wanted), Some(username)) = (&self.username, entity.username()) {
            if wanted != username {
                return false;
            }
        }
        true
    }
}

/// Related collections to attach to every returned record
#[allow(
    clippy::struct_excessive_bools,
    reason = "One presence flag per include directive"
)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    pub authors: bool,
    pub series: bool,
    pub stories: bool,
    pub volumes: bool,
    pub library: bool,
}

impl Include {
    /// Whether the collection of `kind` records was requested
    #[must_use]
    #[inline]
    pub const fn wants(self, kind: ModelKind) -> bool {
        match kind {
            ModelKind::Author => self.authors,
            ModelKind::Series => self.series,
            ModelKind::Story => self.stories,
            ModelKind::Volume => self.volumes,
            ModelKind::Library => self.library,
            ModelKind::User => false,
        }
    }

    #[must_use]
    #[inline]
    pub const fn any(self) -> bool {
        self.authors || self.series || self.stories || self.volumes || self.library
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub matches: Match,
    pub include: Include,
    /// Non-owning parent the listing is joined through, e.g. the author in "stories of this
    /// author". Set from the request path, never from query parameters.
    pub via: Option<Endpoint>,
}

impl Query {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a query from flat parameters. Unknown keys are ignored, as are the values of
    /// presence flags.
    #[must_use]
    #[inline]
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::new();
        for (key, value) in params {
            let value = value.as_ref();
            match key.as_ref() {
                ACTIVE => query.matches.active = true,
                NAME => query.matches.name = Some(value.to_owned()),
                SCOPE => query.matches.scope = Some(value.to_owned()),
                USERNAME => query.matches.username = Some(value.to_owned()),
                WITH_AUTHORS => query.include.authors = true,
                WITH_SERIES => query.include.series = true,
                WITH_STORIES => query.include.stories = true,
                WITH_VOLUMES => query.include.volumes = true,
                WITH_LIBRARY => query.include.library = true,
                _ => {}
            }
        }
        query
    }

    /// Flat parameters in wire form: true flags carry an empty value, false flags are omitted
    #[must_use]
    #[inline]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.matches.active {
            params.push((ACTIVE, String::new()));
        }
        if let Some(name) = &self.matches.name {
            params.push((NAME, name.clone()));
        }
        if let Some(scope) = &self.matches.scope {
            params.push((SCOPE, scope.clone()));
        }
        if let Some(username) = &self.matches.username {
            params.push((USERNAME, username.clone()));
        }
        let flags = [
            (self.include.authors, WITH_AUTHORS),
            (self.include.series, WITH_SERIES),
            (self.include.stories, WITH_STORIES),
            (self.include.volumes, WITH_VOLUMES),
            (self.include.library, WITH_LIBRARY),
        ];
        params.extend(
            flags
                .into_iter()
                .filter(|&(set, _)| set)
                .map(|(_, key)| (key, String::new())),
        );
        params
    }

    /// Percent-encoded query string including the leading `?`, or empty when nothing is set
    #[must_use]
    #[inline]
    pub fn to_query_string(&self) -> String {
        let params = self.to_params();
        if params.is_empty() {
            return String::new();
        }
        let pairs: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{key}={}", encode(value)))
            .collect();
        format!("?{}", pairs.join("&"))
    }

    #[must_use]
    #[inline]
    pub fn matches<T: Entity>(&self, entity: &T) -> bool {
        self.matches.matches(entity)
    }

    #[must_use]
    #[inline]
    pub const fn active(mut self) -> Self {
        self.matches.active = true;
        self
    }

    #[must_use]
    #[inline]
    pub fn name(mut self, name: &str) -> Self {
        self.matches.name = Some(name.to_owned());
        self
    }

    #[must_use]
    #[inline]
    pub fn scope(mut self, scope: &str) -> Self {
        self.matches.scope = Some(scope.to_owned());
        self
    }

    #[must_use]
    #[inline]
    pub fn username(mut self, username: &str) -> Self {
        self.matches.username = Some(username.to_owned());
        self
    }

    /// Requests the related collection of `kind` records (`ModelKind::Library` for the owner)
    #[must_use]
    #[inline]
    pub const fn with(mut self, kind: ModelKind) -> Self {
        match kind {
            ModelKind::Author => self.include.authors = true,
            ModelKind::Series => self.include.series = true,
            ModelKind::Story => self.include.stories = true,
            ModelKind::Volume => self.include.volumes = true,
            ModelKind::Library => self.include.library = true,
            ModelKind::User => {}
        }
        self
    }

    #[must_use]
    #[inline]
    pub const fn via(mut self, parent: Endpoint) -> Self {
        self.via = Some(parent);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Library, User};
    use pretty_assertions::assert_eq;

    #[test]
    fn presence_flags_ignore_values() {
        let query = Query::from_params([
            ("active", ""),
            ("withStories", "false"),
            ("withLibrary", ""),
            ("ordinal", "3"),
        ]);
        assert!(query.matches.active);
        assert!(query.include.stories);
        assert!(query.include.library);
        assert!(!query.include.authors);
        assert_eq!(query.via, None);
    }

    #[test]
    fn wire_form_omits_false_flags() {
        let query = Query::new()
            .active()
            .name("of ages")
            .with(ModelKind::Author)
            .with(ModelKind::Story);
        assert_eq!(
            query.to_params(),
            vec![
                ("active", String::new()),
                ("name", String::from("of ages")),
                ("withAuthors", String::new()),
                ("withStories", String::new()),
            ]
        );
        assert_eq!(
            query.to_query_string(),
            "?active=&name=of%20ages&withAuthors=&withStories="
        );
        assert_eq!(Query::new().to_query_string(), "");
        assert_eq!(Query::from_params(query.to_params()), query);
    }

    #[test]
    fn name_matches_case_insensitive_substring() {
        let library = Library::new(String::from("Test Lib"), String::from("lib"));
        assert!(Query::new().name("test").matches(&library));
        assert!(Query::new().name("T L").matches(&library));
        assert!(!Query::new().name("other").matches(&library));
    }

    #[test]
    fn active_filters_inactive() {
        let mut library = Library::new(String::from("Old"), String::from("old"));
        library.active = false;
        assert!(!Query::new().active().matches(&library));
        assert!(Query::new().matches(&library));
    }

    #[test]
    fn scope_and_username_are_exact() {
        let user = User::new(
            String::from("fred"),
            String::from("Fred"),
            String::from("superuser"),
        );
        assert!(Query::new().scope("superuser").matches(&user));
        assert!(!Query::new().scope("super").matches(&user));
        assert!(Query::new().username("fred").matches(&user));
        assert!(!Query::new().username("Fred").matches(&user));

        // Libraries have no username, so the predicate does not apply to them
        let library = Library::new(String::from("Test Lib"), String::from("lib"));
        assert!(Query::new().username("fred").matches(&library));
    }
}
