mod config;
mod dashboard;
mod discovery;
mod identity;
mod store;
