use crate::lookup::errors::LookupError;
use crate::lookup::isbn::normalize_isbn;
use crate::lookup::metadata::{VolumeMetadata, parse_volumes_response};
use core::time::Duration;
use log::{info, warn};
use reqwest::{ClientBuilder, header};
use urlencoding::encode;

const GOOGLE_BOOKS_VOLUMES: &str = "https://www.googleapis.com/books/v1/volumes";

#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    /// A HTTP client used to execute all GET requests against Google Books
    http_client: reqwest::Client,
    /// Key sent when the caller has none of their own
    default_key: Option<String>,
}

impl GoogleBooksClient {
    /// Create a new HTTP request client, to be used for all subsequent lookups
    /// # Errors
    /// Fails if the TLS backend cannot be initialised
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
    pub fn new(default_key: Option<String>) -> Result<Self, LookupError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let http_client = ClientBuilder::new()
            .user_agent(concat!("librarian/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(25))
            .pool_max_idle_per_host(1)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http_client,
            default_key: default_key.filter(|key| !key.is_empty()),
        })
    }

    #[must_use]
    #[inline]
    pub fn has_default_key(&self) -> bool {
        self.default_key.is_some()
    }

    /// Looks up the volume with the given ISBN. `api_key` overrides the client's default key,
    /// e.g. with the `googleBooksApiKey` of the requesting user. Without any key the request is
    /// sent anonymously.
    /// # Errors
    /// Fails if the ISBN is malformed, the request fails or the response cannot be parsed
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn lookup_isbn(
        &self,
        isbn: &str,
        api_key: Option<&str>,
    ) -> Result<Option<VolumeMetadata>, LookupError> {
        let isbn = normalize_isbn(isbn)?;
        let key_param = api_key
            .or(self.default_key.as_deref())
            .map(|key| format!("&key={}", encode(key)))
            .unwrap_or_default();
        let url = format!(
            "{GOOGLE_BOOKS_VOLUMES}?q={}{key_param}",
            encode(&format!("isbn:{isbn}"))
        );

        let body = self
            .http_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let metadata = parse_volumes_response(&body)?;
        match &metadata {
            Some(found) => info!("Found '{}' for ISBN {isbn}", found.title),
            None => warn!("No volume found for ISBN {isbn}"),
        }
        Ok(metadata)
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
    fn empty_default_key_is_dropped() {
        assert!(!GoogleBooksClient::new(Some(String::new())).unwrap().has_default_key());
        assert!(GoogleBooksClient::new(Some(String::from("abc"))).unwrap().has_default_key());
    }

    #[tokio::test]
    async fn malformed_isbn_fails_before_any_request() {
        let client = GoogleBooksClient::new(None).unwrap();
        let error = client.lookup_isbn("not-an-isbn", None).await.unwrap_err();
        assert_eq!(error.to_string(), "'not-an-isbn' is not a valid ISBN");
    }
}
