mod allocator;
mod concurrency;
mod dashboard;
mod discovery;
mod error;
mod helpers;
mod identity;
mod lifecycle;
mod store;
