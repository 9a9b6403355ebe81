//! `librarian_core`
//!
//! Core library for the platform-independent logic of Librarian: the in-memory catalog of
//! libraries, users and their authors, series, stories and volumes, the membership edges between
//! them and the query decoration used by every list and detail lookup. The HTTP server only
//! translates requests into calls on [`Catalog`].

pub mod catalog;
pub mod error;
pub mod lookup;
pub mod model;
pub mod query;
pub mod seed;
pub mod sorting;
pub mod store;

pub use catalog::{Catalog, Child, Decorated};
pub use error::{CatalogError, CatalogResult};
pub use query::Query;
