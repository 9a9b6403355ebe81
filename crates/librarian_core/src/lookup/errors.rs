/// Errors raised while looking up a volume by ISBN.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The request to Google Books failed or returned an error status, originating from `reqwest`.
    #[error("Failed to fetch volume metadata: {0}")]
    Fetch(#[from] reqwest::Error),
    /// The response body was not the expected JSON, originating from `serde_json`.
    #[error("Failed to parse volume metadata: {0}")]
    Parse(#[from] serde_json::Error),
    /// The given string is not shaped like an ISBN-10 or ISBN-13.
    #[error("'{0}' is not a valid ISBN")]
    InvalidIsbn(String),
}
