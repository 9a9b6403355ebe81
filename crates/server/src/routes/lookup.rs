use crate::auth::Action;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, Query as QueryString, State};
use axum::routing::get;
use axum::{Json, Router};
use core::mem;
use librarian_core::CatalogError;
use librarian_core::lookup::VolumeMetadata;
use librarian_core::model::{UNSAVED_ID, Volume};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Relative to `/volumes`
pub fn routes() -> Router<AppState> {
    Router::new().route("/lookup/:isbn", get(lookup_isbn))
}

#[derive(Deserialize, Debug, Default)]
pub struct LookupParams {
    /// User whose `googleBooksApiKey` is sent instead of the server's
    username: Option<String>,
}

/// An unsaved volume plus the metadata a volume record has no field for
#[derive(Serialize, Debug)]
struct VolumeDraft {
    #[serde(flatten)]
    volume: Volume,
    /// Author names as Google Books lists them, to be matched against catalog authors
    authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publisher: Option<String>,
}

impl From<VolumeMetadata> for VolumeDraft {
    fn from(mut metadata: VolumeMetadata) -> Self {
        let authors = mem::take(&mut metadata.authors);
        let publisher = metadata.publisher.take();
        Self {
            volume: metadata.into_volume(UNSAVED_ID),
            authors,
            publisher,
        }
    }
}

/// Returns an unsaved volume draft filled from Google Books
#[instrument(skip(state))]
async fn lookup_isbn(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    QueryString(params): QueryString<LookupParams>,
) -> ApiResult<Json<VolumeDraft>> {
    let context = format!("volumes.lookup(isbn={isbn})");
    state.authorize(Action::Read, &context)?;
    let Some(client) = &state.lookup else {
        return Err(ApiError::unavailable("ISBN lookup is not available", context));
    };

    let user_key = match &params.username {
        Some(username) => {
            let catalog = state.catalog.read().await;
            catalog
                .exact_user(username)
                .map_err(|error| error.with_context(&context))?
                .google_books_api_key
        }
        None => None,
    };

    let metadata = client.lookup_isbn(&isbn, user_key.as_deref()).await?;
    metadata
        .map(|found| Json(VolumeDraft::from(found)))
        .ok_or_else(|| {
            CatalogError::not_found(format!("No volume found for ISBN {isbn}"), context).into()
        })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::VolumeDraft;
    use crate::routes::router;
    use crate::state::AppState;
    use crate::testing::send;
    use axum::http::{Method, StatusCode};
    use librarian_core::lookup::{GoogleBooksClient, parse_volumes_response};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn draft_carries_authors_and_publisher() {
        let body = r#"{"items": [{"volumeInfo": {
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "publisher": "Chilton Books",
            "publishedDate": "1965",
            "industryIdentifiers": [{ "type": "ISBN_13", "identifier": "9780441013593" }]
        }}]}"#;
        let metadata = parse_volumes_response(body).unwrap().unwrap();
        let draft = serde_json::to_value(VolumeDraft::from(metadata)).unwrap();
        assert_eq!(draft["name"], "Dune");
        assert_eq!(draft["copyright"], "1965");
        assert_eq!(draft["isbn"], "9780441013593");
        assert_eq!(draft["authors"], json!(["Frank Herbert"]));
        assert_eq!(draft["publisher"], "Chilton Books");
    }

    #[test]
    fn draft_without_publisher_omits_it() {
        let body = r#"{"items": [{"volumeInfo": {"title": "Anonymous Verse"}}]}"#;
        let metadata = parse_volumes_response(body).unwrap().unwrap();
        let draft = serde_json::to_value(VolumeDraft::from(metadata)).unwrap();
        assert_eq!(draft["authors"], json!([]));
        assert!(draft.get("publisher").is_none());
    }

    #[tokio::test]
    async fn unavailable_without_client() {
        let app = router(AppState::default());
        let (status, body) = send(&app, Method::GET, "/volumes/lookup/9780261102217", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["context"], "volumes.lookup(isbn=9780261102217)");
    }

    #[tokio::test]
    async fn malformed_isbn_is_bad_request() {
        let Ok(client) = GoogleBooksClient::new(None) else {
            return;
        };
        let app = router(AppState::default().with_lookup(client));
        let (status, body) = send(&app, Method::GET, "/volumes/lookup/12345", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "'12345' is not a valid ISBN");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let Ok(client) = GoogleBooksClient::new(None) else {
            return;
        };
        let app = router(AppState::default().with_lookup(client));
        let (status, _) = send(
            &app,
            Method::GET,
            "/volumes/lookup/9780261102217?username=barney",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
