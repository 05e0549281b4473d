//! Core traits
//!
//! - [`RecordApi`]: create, read, update, delete and list DNS records remotely

pub mod record_api;

pub use record_api::RecordApi;
