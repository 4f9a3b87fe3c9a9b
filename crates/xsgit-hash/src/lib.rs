//! Object identifiers and the SHA-1 framing used by the object store.

mod error;
mod hex;
mod oid;

pub use error::HashError;
pub use oid::ObjectId;
