mod registry;
mod server_entry;
