pub mod cleanup;
pub mod dashboard;
pub mod list;
pub mod serve;
