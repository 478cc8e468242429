//! Foundation types for the Field Store.
//!
//! A [`Field`] is a named value with an optional comment. The name is the
//! record's only key and is compared case-insensitively.
//!
//! # Key Types
//!
//! - [`Field`] -- the unit of persistence
//! - [`FieldError`] -- validation failures for names and values

pub mod error;
pub mod field;
pub mod name;

pub use error::{FieldError, FieldResult};
pub use field::Field;
pub use name::{names_match, validate_name, validate_value, DEFAULT_MAX_NAME_LEN};
