//! sqlx repositories backing the store traits and auth entities.
//!
//! Each repository wraps a `PgPool` and converts rows through `try_into_*`
//! helpers so malformed stored data surfaces as a decode error instead of a
//! panic.

pub mod canvas;
pub mod conversation;
pub mod session;
pub mod turn;
pub mod user;

/// Builds a decode error for a row that could not be converted.
pub(crate) fn decode_error(context: String) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        context,
    )))
}
