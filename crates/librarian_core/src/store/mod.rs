//! In-memory storage
//!
//! [`EntityStore`] keeps the records of one type keyed by id, [`MembershipSet`] keeps the edges
//! of one many-to-many [`Relation`]. Neither knows about the other; the catalog combines them.
pub mod entity;
pub mod membership;

pub use entity::EntityStore;
pub use membership::{Edge, MembershipSet, Relation, Side, sort_by_ordinal};
