use crate::auth::Action;
use crate::error::ApiResult;
use crate::routes::Params;
use crate::state::AppState;
use axum::extract::{Path, Query as QueryString, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use librarian_core::Query;
use librarian_core::model::{Id, User, UserPatch};
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
) -> ApiResult<Json<Vec<User>>> {
    state.authorize(Action::Read, "users.all")?;
    let query = Query::from_params(params);
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.all_users(&query)))
}

#[instrument(skip(state))]
async fn exact(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Json<User>> {
    state.authorize(Action::Read, &format!("users.exact(username={username})"))?;
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.exact_user(&username)?))
}

#[instrument(skip(state))]
async fn find(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<User>> {
    state.authorize(Action::Read, &format!("users.find(id={id})"))?;
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.find_user(id)?))
}

#[instrument(skip(state, user))]
async fn insert(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> ApiResult<(StatusCode, Json<User>)> {
    state.authorize(Action::Write, "users.insert")?;
    let inserted = state.catalog.write().await.insert_user(user)?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

#[instrument(skip(state, patch))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<User>> {
    state.authorize(Action::Write, &format!("users.update(id={id})"))?;
    let updated = state.catalog.write().await.update_user(id, patch)?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
async fn remove(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<User>> {
    state.authorize(Action::Write, &format!("users.remove(id={id})"))?;
    let removed = state.catalog.write().await.remove_user(id)?;
    Ok(Json(removed))
}

#[cfg(test)]
mod tests {
    use crate::routes::router;
    use crate::state::AppState;
    use crate::testing::send;
    use axum::http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn password_is_never_returned() {
        let app = router(AppState::default());
        let (status, created) = send(
            &app,
            Method::POST,
            "/users",
            Some(json!({
                "username": "fred",
                "name": "Fred Flintstone",
                "password": "yabbadabbadoo",
                "scope": "lib:admin"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.get("password"), None);

        let (status, found) = send(&app, Method::GET, "/users/exact/fred", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["id"], 1);
        assert_eq!(found.get("password"), None);
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let app = router(AppState::default());
        let (status, body) = send(&app, Method::GET, "/users/exact/barney", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }
}
