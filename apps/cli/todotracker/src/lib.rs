// Library exports for testing
// The binary (main.rs) imports these as well

pub mod commands;
pub mod context;
pub mod error;
pub mod logger;
pub mod output;
pub mod shutdown;

#[cfg(test)]
mod tests;
