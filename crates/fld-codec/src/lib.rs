//! Line codec for the Field Store log.
//!
//! Each [`Field`](fld_types::Field) is stored as one JSON object on one line:
//!
//! ```text
//! {"Name":"host","Value":"db.local","Comment":"primary"}
//! ```
//!
//! JSON string escaping turns line terminators and every other control
//! character inside a value into escape sequences, so an encoded record
//! never spans more than one line and decodes back to the same field.

pub mod codec;
pub mod error;

pub use codec::FieldCodec;
pub use error::{CodecError, CodecResult};
