//! Domain models for the TodoTracker server registry.
//!
//! Pure data structures describing which project servers are running where.
//! No I/O and no process inspection happen here; `registry-core` owns all of
//! that and operates on these types.
//!
//! ## Architecture
//!
//! - **models** (this crate): `ServerEntry`, `Registry`, builder validation
//! - **registry-core**: persistence, locking, liveness, allocation, lifecycle
//! - **todotracker**: the binary wiring everything together

pub mod error;
pub mod registry;
pub mod server_entry;

#[cfg(test)]
mod tests;

pub use common::ErrorLocation;
pub use error::model_error::ModelError;
pub use registry::Registry;
pub use server_entry::ServerEntry;
pub use server_entry::builder::ServerEntryBuilder;
