//! Who may see and who may change albums and photos.
//!
//! [`policy`] holds the two predicates, [`query`] applies them to every
//! read path so a listing and a lookup by id can never disagree.

pub mod policy;
pub mod query;

pub use policy::{can_mutate, can_view, Principal, Viewer};
pub use query::*;
