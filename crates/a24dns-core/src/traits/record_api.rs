// # Record API Trait
//
// Defines the interface the reconciler and import resolver use to talk to the
// remote DNS record endpoints.
//
// ## Implementations
//
// - Active24 REST v2: `a24dns-provider-active24` crate
// - Tests: in-memory doubles under `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use a24dns_core::{ListFilter, RecordApi};
//
// async fn show(api: &dyn RecordApi) -> a24dns_core::Result<()> {
//     let records = api
//         .list_records("example.com", &ListFilter::new().record_type("MX"))
//         .await?;
//     for rec in records {
//         println!("{:?} {}", rec.id, rec.name);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ApiRecord, ListFilter, RecordId, RecordPayload};

/// Client for the remote DNS record endpoints
///
/// Every method takes the zone target (service key or domain) that routes
/// the call. Implementations perform exactly one HTTP exchange per call and
/// never retry; retry policy belongs to whoever drives the reconciler.
///
/// # Thread Safety
///
/// Implementations hold only immutable configuration and a transport handle
/// and must be usable across async tasks.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Create a record
    ///
    /// Returns `Ok(None)` when the API accepted the record but answered with
    /// an empty body; the caller has to look the record up.
    async fn create_record(&self, target: &str, payload: &RecordPayload) -> Result<Option<ApiRecord>>;

    /// Fetch one record by ID; a missing record is an error
    async fn get_record(&self, target: &str, id: RecordId) -> Result<ApiRecord>;

    /// Replace every field of a record
    ///
    /// Returns `Ok(None)` when the API answered with an empty body.
    async fn update_record(&self, target: &str, id: RecordId, payload: &RecordPayload) -> Result<Option<ApiRecord>>;

    /// Delete a record; whatever the API answers is surfaced as-is
    async fn delete_record(&self, target: &str, id: RecordId) -> Result<()>;

    /// List records matching `filter`
    async fn list_records(&self, target: &str, filter: &ListFilter) -> Result<Vec<ApiRecord>>;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
