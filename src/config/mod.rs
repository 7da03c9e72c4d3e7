pub mod vault_options;
