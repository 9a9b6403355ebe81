use crate::auth::Action;
use crate::error::{ApiError, ApiResult};
use crate::routes::Params;
use crate::state::AppState;
use axum::extract::{Path, Query as QueryString, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use librarian_core::model::{Author, Endpoint, Id, ModelKind, Series, Story, Volume};
use librarian_core::{Catalog, CatalogError, Child, Decorated, Query};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// CRUD, via listing and membership routes for one library-owned type, relative to its plural
/// path segment
pub fn routes<T: Child>() -> Router<AppState> {
    Router::new()
        .route("/:library_id", get(all::<T>).post(insert::<T>))
        .route("/:library_id/exact/:name", get(exact::<T>))
        .route(
            "/:library_id/:id",
            get(find::<T>).put(update::<T>).delete(remove::<T>),
        )
        .route("/:library_id/:id/:other", get(via::<T>))
        .route(
            "/:library_id/:id/:other/:other_id",
            post(include::<T>).delete(exclude::<T>),
        )
}

/// A list of records of whichever type the path asked for
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum Listing {
    Authors(Vec<Decorated<Author>>),
    Series(Vec<Decorated<Series>>),
    Stories(Vec<Decorated<Story>>),
    Volumes(Vec<Decorated<Volume>>),
}

#[derive(Deserialize, Debug, Default)]
pub struct OrdinalParams {
    ordinal: Option<String>,
}

/// Outcome of an include or exclude request
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MembershipChange {
    pub child: Endpoint,
    pub other: Endpoint,
    /// Whether an edge was created (include) or removed (exclude)
    pub changed: bool,
}

#[instrument(skip(state))]
async fn all<T: Child>(
    State(state): State<AppState>,
    Path(library_id): Path<Id>,
    QueryString(params): QueryString<Params>,
) -> ApiResult<Json<Vec<Decorated<T>>>> {
    let context = format!("{}.all(libraryId={library_id})", T::KIND.plural());
    state.authorize(Action::Read, &context)?;
    let query = Query::from_params(params);
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.all::<T>(library_id, &query)?))
}

#[instrument(skip(state))]
async fn exact<T: Child>(
    State(state): State<AppState>,
    Path((library_id, name)): Path<(Id, String)>,
    QueryString(params): QueryString<Params>,
) -> ApiResult<Json<Decorated<T>>> {
    let context = format!("{}.exact(libraryId={library_id}, name={name})", T::KIND.plural());
    state.authorize(Action::Read, &context)?;
    let query = Query::from_params(params);
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.exact::<T>(library_id, &name, &query)?))
}

/// Authors are named by two segments, first and last name
#[instrument(skip(state))]
pub async fn exact_author(
    State(state): State<AppState>,
    Path((library_id, first_name, last_name)): Path<(Id, String, String)>,
    QueryString(params): QueryString<Params>,
) -> ApiResult<Json<Decorated<Author>>> {
    let name = format!("{first_name} {last_name}");
    exact::<Author>(State(state), Path((library_id, name)), QueryString(params)).await
}

#[instrument(skip(state))]
async fn find<T: Child>(
    State(state): State<AppState>,
    Path((library_id, id)): Path<(Id, Id)>,
    QueryString(params): QueryString<Params>,
) -> ApiResult<Json<Decorated<T>>> {
    let context = format!("{}.find(libraryId={library_id}, id={id})", T::KIND.plural());
    state.authorize(Action::Read, &context)?;
    let query = Query::from_params(params);
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.find::<T>(library_id, id, &query)?))
}

#[instrument(skip(state))]
async fn insert<T: Child>(
    State(state): State<AppState>,
    Path(library_id): Path<Id>,
    Json(entity): Json<T>,
) -> ApiResult<(StatusCode, Json<T>)> {
    let context = format!("{}.insert(libraryId={library_id})", T::KIND.plural());
    state.authorize(Action::Write, &context)?;
    let inserted = state.catalog.write().await.insert(library_id, entity)?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

#[instrument(skip(state))]
async fn update<T: Child>(
    State(state): State<AppState>,
    Path((library_id, id)): Path<(Id, Id)>,
    Json(patch): Json<T::Patch>,
) -> ApiResult<Json<T>> {
    let context = format!("{}.update(libraryId={library_id}, id={id})", T::KIND.plural());
    state.authorize(Action::Write, &context)?;
    let updated = state.catalog.write().await.update::<T>(library_id, id, patch)?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
async fn remove<T: Child>(
    State(state): State<AppState>,
    Path((library_id, id)): Path<(Id, Id)>,
) -> ApiResult<Json<T>> {
    let context = format!("{}.remove(libraryId={library_id}, id={id})", T::KIND.plural());
    state.authorize(Action::Write, &context)?;
    let removed = state.catalog.write().await.remove::<T>(library_id, id)?;
    Ok(Json(removed))
}

/// Lists the `other` records joined to the record at `id`, e.g. the stories of an author
#[instrument(skip(state))]
async fn via<T: Child>(
    State(state): State<AppState>,
    Path((library_id, id, other)): Path<(Id, Id, String)>,
    QueryString(params): QueryString<Params>,
) -> ApiResult<Json<Listing>> {
    let context = format!(
        "{other}.all(libraryId={library_id}, {})",
        Endpoint::new(T::KIND, id)
    );
    state.authorize(Action::Read, &context)?;
    let kind = parse_kind(&other, &context)?;
    let query = Query::from_params(params).via(Endpoint::new(T::KIND, id));
    let catalog = state.catalog.read().await;
    Ok(Json(listing(&catalog, library_id, kind, &query, &context)?))
}

#[instrument(skip(state))]
async fn include<T: Child>(
    State(state): State<AppState>,
    Path((library_id, id, other, other_id)): Path<(Id, Id, String, Id)>,
    QueryString(params): QueryString<OrdinalParams>,
) -> ApiResult<(StatusCode, Json<MembershipChange>)> {
    let context = format!(
        "{}.include(libraryId={library_id}, id={id}, {other}={other_id})",
        T::KIND.plural()
    );
    state.authorize(Action::Write, &context)?;
    let other = Endpoint::new(parse_kind(&other, &context)?, other_id);
    let ordinal = parse_ordinal(params.ordinal.as_deref(), &context)?;
    let child = Endpoint::new(T::KIND, id);
    let changed = state
        .catalog
        .write()
        .await
        .include(library_id, child, other, ordinal)?;
    let status = if changed {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(MembershipChange {
            child,
            other,
            changed,
        }),
    ))
}

#[instrument(skip(state))]
async fn exclude<T: Child>(
    State(state): State<AppState>,
    Path((library_id, id, other, other_id)): Path<(Id, Id, String, Id)>,
) -> ApiResult<Json<MembershipChange>> {
    let context = format!(
        "{}.exclude(libraryId={library_id}, id={id}, {other}={other_id})",
        T::KIND.plural()
    );
    state.authorize(Action::Write, &context)?;
    let other = Endpoint::new(parse_kind(&other, &context)?, other_id);
    let child = Endpoint::new(T::KIND, id);
    let changed = state
        .catalog
        .write()
        .await
        .exclude(library_id, child, other)?;
    Ok(Json(MembershipChange {
        child,
        other,
        changed,
    }))
}

fn parse_kind(segment: &str, context: &str) -> Result<ModelKind, CatalogError> {
    segment
        .parse()
        .map_err(|message: String| CatalogError::not_found(message, context))
}

/// Empty or absent means no ordinal
fn parse_ordinal(raw: Option<&str>, context: &str) -> ApiResult<Option<i64>> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            ApiError::bad_request(format!("Ordinal '{raw}' is not an integer"), context)
        }),
    }
}

fn listing(
    catalog: &Catalog,
    library_id: Id,
    kind: ModelKind,
    query: &Query,
    context: &str,
) -> Result<Listing, CatalogError> {
    Ok(match kind {
        ModelKind::Author => Listing::Authors(catalog.all::<Author>(library_id, query)?),
        ModelKind::Series => Listing::Series(catalog.all::<Series>(library_id, query)?),
        ModelKind::Story => Listing::Stories(catalog.all::<Story>(library_id, query)?),
        ModelKind::Volume => Listing::Volumes(catalog.all::<Volume>(library_id, query)?),
        ModelKind::Library | ModelKind::User => {
            let owner = query.via.map_or(kind, |via| via.kind);
            return Err(CatalogError::not_found(
                format!("A {owner} has no related {}", kind.plural()),
                context,
            ));
        }
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::auth::ReadOnly;
    use crate::routes::router;
    use crate::testing::send;
    use axum::http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Arc;

    async fn post(app: &Router, uri: &str, body: Value) -> Value {
        let (status, created) = send(app, Method::POST, uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri}");
        created
    }

    async fn flintstones() -> Router {
        let app = router(AppState::default());
        post(&app, "/libraries", json!({ "name": "Test Lib", "scope": "lib" })).await;
        post(
            &app,
            "/authors/1",
            json!({ "firstName": "Fred", "lastName": "Flintstone" }),
        )
        .await;
        app
    }

    fn names(listed: &Value, key: &str) -> Vec<String> {
        listed
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|entry| entry[key].as_str().map(str::to_owned))
            .collect()
    }

    #[tokio::test]
    async fn lists_authors_of_library() {
        let app = flintstones().await;
        let (status, listed) = send(&app, Method::GET, "/authors/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            listed,
            json!([{
                "id": 1,
                "libraryId": 1,
                "firstName": "Fred",
                "lastName": "Flintstone",
                "active": true
            }])
        );
    }

    #[tokio::test]
    async fn exact_author_by_both_names() {
        let app = flintstones().await;
        let (status, found) = send(&app, Method::GET, "/authors/1/exact/Fred/Flintstone", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["id"], 1);

        let (status, body) = send(&app, Method::GET, "/authors/1/exact/Wilma/Flintstone", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn insert_into_missing_library_is_not_found() {
        let app = router(AppState::default());
        let (status, body) = send(
            &app,
            Method::POST,
            "/stories/7",
            Some(json!({ "name": "The Quarry" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No library with id 7");
    }

    #[tokio::test]
    async fn series_stories_come_in_ordinal_order() {
        let app = flintstones().await;
        post(&app, "/series/1", json!({ "name": "Bedrock Tales" })).await;
        for name in ["Third", "First", "Unnumbered", "Second"] {
            post(&app, "/stories/1", json!({ "name": name })).await;
        }
        for (story, ordinal) in [(1, "3"), (2, "1"), (3, ""), (4, "2")] {
            let uri = format!("/series/1/1/stories/{story}?ordinal={ordinal}");
            let (status, change) = send(&app, Method::POST, &uri, None).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(change["changed"], true);
        }

        let (status, listed) = send(&app, Method::GET, "/series/1/1/stories", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            names(&listed, "name"),
            vec!["First", "Second", "Third", "Unnumbered"]
        );
        assert_eq!(listed[0]["ordinal"], 1);
        assert_eq!(listed[3].get("ordinal"), None);

        let (status, found) = send(&app, Method::GET, "/series/1/1?withStories=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&found["stories"], "name")[0], "First");
    }

    #[tokio::test]
    async fn include_twice_then_exclude() {
        let app = flintstones().await;
        post(&app, "/stories/1", json!({ "name": "The Quarry" })).await;

        let (status, _) = send(&app, Method::POST, "/authors/1/1/stories/1", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, change) = send(&app, Method::POST, "/authors/1/1/stories/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(change["changed"], false);

        let (_, listed) = send(&app, Method::GET, "/stories/1/1/authors", None).await;
        assert_eq!(names(&listed, "lastName"), vec!["Flintstone"]);

        let (status, change) = send(&app, Method::DELETE, "/authors/1/1/stories/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(change["changed"], true);
        let (status, change) = send(&app, Method::DELETE, "/authors/1/1/stories/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(change["changed"], false);
    }

    #[tokio::test]
    async fn unrelated_or_unknown_types_are_not_found() {
        let app = flintstones().await;
        post(&app, "/series/1", json!({ "name": "Bedrock Tales" })).await;
        post(&app, "/volumes/1", json!({ "name": "Omnibus" })).await;

        let (status, body) = send(&app, Method::POST, "/series/1/1/volumes/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "A series cannot include volumes");

        let (status, _) = send(&app, Method::GET, "/authors/1/1/dinosaurs", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/authors/1/1/users", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_ordinal_is_bad_request() {
        let app = flintstones().await;
        post(&app, "/series/1", json!({ "name": "Bedrock Tales" })).await;
        post(&app, "/stories/1", json!({ "name": "The Quarry" })).await;
        let (status, body) =
            send(&app, Method::POST, "/series/1/1/stories/1?ordinal=first", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn update_keeps_id_and_library() {
        let app = flintstones().await;
        let (status, updated) = send(
            &app,
            Method::PUT,
            "/authors/1/1",
            Some(json!({ "notes": "Quarry worker", "libraryId": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], 1);
        assert_eq!(updated["libraryId"], 1);
        assert_eq!(updated["firstName"], "Fred");
        assert_eq!(updated["notes"], "Quarry worker");
    }

    #[tokio::test]
    async fn read_only_catalog_forbids_writes() {
        let mut catalog = Catalog::new();
        catalog
            .insert_library(librarian_core::model::Library::new(
                String::from("Test Lib"),
                String::from("lib"),
            ))
            .unwrap();
        let app = router(AppState::new(catalog, Arc::new(ReadOnly)));

        let (status, body) = send(
            &app,
            Method::POST,
            "/authors/1",
            Some(json!({ "firstName": "Fred", "lastName": "Flintstone" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body,
            json!({
                "context": "authors.insert(libraryId=1)",
                "message": "This catalog is read-only",
                "status": 403
            })
        );
        let (status, _) = send(&app, Method::GET, "/authors/1", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
