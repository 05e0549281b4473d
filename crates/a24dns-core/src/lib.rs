// # a24dns-core
//
// Core library for reconciling DNS records against the Active24 REST API.
//
// ## Architecture Overview
//
// - **RecordApi**: Trait for the remote record endpoints (create/get/update/delete/list)
// - **Reconciler**: Maps desired records onto API calls and merges answers into observed state
// - **ImportResolver**: Turns a colon-delimited import identifier into a concrete record
// - **RecordPolicy**: Per-type field handling (plain content vs. CAA fields)
// - **ProviderConfig**: Credentials and base URL with environment fallbacks
//
// ## Design Principles
//
// 1. **No HTTP here**: the core sees only `RecordApi`; transport lives in provider crates
// 2. **Stateless**: observed state is passed in and returned, never stored
// 3. **No retries**: every error is returned to the caller
// 4. **Tri-state merge**: API fields are unknown, null or a value, never guessed from ""

pub mod config;
pub mod error;
pub mod import;
pub mod model;
pub mod naming;
pub mod policy;
pub mod reconciler;
pub mod traits;

// Re-export core types for convenience
pub use config::{ProviderConfig, ResolvedConfig};
pub use error::{Candidate, Error, Result};
pub use import::{ImportId, ImportResolver};
pub use model::{
    ApiRecord, DesiredRecord, Field, ListFilter, ObservedRecord, RecordId, RecordPayload,
    RecordRef, RecordType,
};
pub use policy::{RecordPolicy, policy_for};
pub use reconciler::Reconciler;
pub use traits::RecordApi;
