pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod sources;

mod testing;
