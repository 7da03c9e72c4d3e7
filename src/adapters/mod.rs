pub mod retry;
pub mod sources;
