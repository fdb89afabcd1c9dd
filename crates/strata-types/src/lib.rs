//! Foundation types for Strata.
//!
//! Every other Strata crate depends on `strata-types` for [`ObjectId`], the
//! fixed-length digest that names every immutable object in a repository.

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::ObjectId;
