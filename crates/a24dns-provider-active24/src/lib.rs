// # Active24 DNS Provider
//
// Signed HTTP client for the Active24 REST API v2 DNS record endpoints,
// implementing `a24dns_core::RecordApi`.
//
// ## Behaviour
//
// - One HTTP request per trait call; no retries, no caching, no background tasks
// - Every request signed with HMAC-SHA1 over method, path and timestamp
// - 15 second timeout per request
// - Non-2xx responses returned as `Error::Api` with status line and raw body
// - Optional cancellation token aborts the in-flight request
//
// ## Security
//
// - The API secret is held as `secrecy::SecretString` and never logged
// - Request/response bodies are logged only when `ACTIVE24_DEBUG` is truthy
//
// ## API Reference
//
// - Base URL: `https://rest.active24.cz/v2`
// - Records: `/service/:target/dns/record[/:id]`
// - List filters: `filters[name]`, `filters[type]`, `filters[content]`, `filters[ttl]`

pub mod client;
pub mod signer;

pub use client::Active24Client;
pub use signer::{SignedHeaders, sign};
