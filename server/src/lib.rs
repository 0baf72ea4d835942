//! Authenticated HTTP ingestion and querying of analytics events

pub mod api;
mod app;
pub mod core;
pub mod data;
pub mod utils;
