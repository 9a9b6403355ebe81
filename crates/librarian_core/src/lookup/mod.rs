//! ISBN lookup
//!
//! Fills volume drafts from the Google Books volumes API. The HTTP side lives in [`client`],
//! the response parsing in [`metadata`] so it can be exercised without a network.
pub mod client;
pub mod errors;
pub mod isbn;
pub mod metadata;

pub use client::GoogleBooksClient;
pub use errors::LookupError;
pub use isbn::normalize_isbn;
pub use metadata::{VolumeMetadata, parse_volumes_response};
