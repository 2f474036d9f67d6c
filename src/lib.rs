pub mod analyze;
pub mod config;
pub mod fetch;
pub mod load;
pub mod plot;
