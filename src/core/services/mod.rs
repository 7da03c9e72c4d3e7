pub mod prefix_codec;
pub mod vault_configuration;
pub mod vault_loader;
