// src/services/mod.rs
pub mod aggregate;
pub mod fetch;
pub mod forecast;
pub mod incident;
pub mod ols;
pub mod pipeline;
pub mod store;
