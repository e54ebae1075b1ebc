mod error;
mod logger;
mod output;
#[cfg(unix)]
mod shutdown;
