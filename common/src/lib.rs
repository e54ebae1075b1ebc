//! Shared building blocks for the TodoTracker server registry.
//!
//! Everything here is dependency-light so both the `models` crate and the
//! behavioral crates can use it:
//!
//! - [`ErrorLocation`]: file/line/column captured at the point an error is built
//! - [`Remedy`]: the one-line "how to fix it" attached to every fatal error

pub mod error;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::remedy::Remedy;
