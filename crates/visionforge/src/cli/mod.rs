//! Command implementations.

pub mod caption;
pub mod config;
pub mod optimize;
pub mod providers;
pub mod types;
