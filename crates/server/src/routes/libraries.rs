use crate::auth::Action;
use crate::error::ApiResult;
use crate::routes::Params;
use crate::state::AppState;
use axum::extract::{Path, Query as QueryString, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use librarian_core::model::{Id, Library, LibraryPatch};
use librarian_core::{Decorated, Query};
use tracing::instrument;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(all).post(insert))
        .route("/exact/:name", get(exact))
        .route("/:id", get(find).put(update).delete(remove))
}

#[instrument(skip(state))]
async fn all(
    State(state): State<AppState>,
    QueryString(params): QueryString<Params>,
) -> ApiResult<Json<Vec<Decorated<Library>>>> {
    state.authorize(Action::Read, "libraries.all")?;
    let query = Query::from_params(params);
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.all_libraries(&query)))
}

#[instrument(skip(state))]
async fn exact(
    State(state): State<AppState>,
    Path(name): Path<String>,
    QueryString(params): QueryString<Params>,
) -> ApiResult<Json<Decorated<Library>>> {
    state.authorize(Action::Read, &format!("libraries.exact(name={name})"))?;
    let query = Query::from_params(params);
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.exact_library(&name, &query)?))
}

#[instrument(skip(state))]
async fn find(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    QueryString(params): QueryString<Params>,
) -> ApiResult<Json<Decorated<Library>>> {
    state.authorize(Action::Read, &format!("libraries.find(id={id})"))?;
    let query = Query::from_params(params);
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.find_library(id, &query)?))
}

#[instrument(skip(state))]
async fn insert(
    State(state): State<AppState>,
    Json(library): Json<Library>,
) -> ApiResult<(StatusCode, Json<Library>)> {
    state.authorize(Action::Write, "libraries.insert")?;
    let inserted = state.catalog.write().await.insert_library(library)?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

#[instrument(skip(state))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(patch): Json<LibraryPatch>,
) -> ApiResult<Json<Library>> {
    state.authorize(Action::Write, &format!("libraries.update(id={id})"))?;
    let updated = state.catalog.write().await.update_library(id, patch)?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
async fn remove(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Library>> {
    state.authorize(Action::Write, &format!("libraries.remove(id={id})"))?;
    let removed = state.catalog.write().await.remove_library(id)?;
    Ok(Json(removed))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use crate::routes::router;
    use crate::state::AppState;
    use crate::testing::send;
    use axum::http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn insert_find_update_remove() {
        let app = router(AppState::default());

        let (status, created) = send(
            &app,
            Method::POST,
            "/libraries",
            Some(json!({ "name": "Test Lib", "scope": "lib" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            created,
            json!({ "id": 1, "name": "Test Lib", "scope": "lib", "active": true })
        );

        let (status, updated) = send(
            &app,
            Method::PUT,
            "/libraries/1",
            Some(json!({ "notes": "Shelf by the window", "id": 99 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], 1);
        assert_eq!(updated["name"], "Test Lib");
        assert_eq!(updated["notes"], "Shelf by the window");

        let (status, found) = send(&app, Method::GET, "/libraries/exact/Test%20Lib", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found, updated);

        let (status, _) = send(&app, Method::DELETE, "/libraries/1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, Method::GET, "/libraries/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "No library with id 1");
    }

    #[tokio::test]
    async fn list_applies_match_parameters() {
        let app = router(AppState::default());
        for (name, scope) in [("Fiction", "fic"), ("Reference", "ref"), ("Fiction Annex", "fic2")] {
            send(
                &app,
                Method::POST,
                "/libraries",
                Some(json!({ "name": name, "scope": scope })),
            )
            .await;
        }
        send(
            &app,
            Method::PUT,
            "/libraries/3",
            Some(json!({ "active": false })),
        )
        .await;

        let (status, listed) = send(&app, Method::GET, "/libraries?name=fiction&active=", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|library| library["name"].as_str())
            .collect();
        assert_eq!(names, vec!["Fiction"]);
    }
}
