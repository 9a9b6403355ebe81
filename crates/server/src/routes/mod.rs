//! Routes
//!
//! Every record type is served under its plural path segment. Library-owned types share one
//! generic set of handlers in [`children`], nested below the id of their library.
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use librarian_core::model::{Author, Series, Story, Volume};

pub mod children;
pub mod libraries;
pub mod lookup;
pub mod users;

/// Flat query-string parameters, in the order they were given
pub type Params = Vec<(String, String)>;

pub fn router(state: AppState) -> Router {
    let authors = children::routes::<Author>().route(
        "/:library_id/exact/:name/:last_name",
        get(children::exact_author),
    );
    let volumes = children::routes::<Volume>().merge(lookup::routes());

    Router::new()
        .nest("/libraries", libraries::routes())
        .nest("/users", users::routes())
        .nest("/authors", authors)
        .nest("/series", children::routes::<Series>())
        .nest("/stories", children::routes::<Story>())
        .nest("/volumes", volumes)
        .with_state(state)
}
