pub mod health;
pub mod port;
pub mod process;
