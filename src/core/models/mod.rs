pub mod configuration;
pub mod credential;
pub mod environment;
pub mod retry;
pub mod secret;
