mod lock;
mod registry_file;
