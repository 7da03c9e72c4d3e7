pub mod retrying_source;
