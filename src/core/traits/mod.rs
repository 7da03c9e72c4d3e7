pub mod secret_source;
