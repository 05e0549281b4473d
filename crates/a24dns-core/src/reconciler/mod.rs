//! Record reconciler
//!
//! Maps desired state onto record API calls and merges the answers back into
//! observed state.
//!
//! ## Lifecycle of a managed record
//!
//! ```text
//!  Absent ──create──▶ Present ──update──▶ Present
//!    ▲                  │  ▲                │
//!    │                  │  └────read────────┘
//!    └────delete────────┘
//!    └────read (record vanished remotely)
//! ```
//!
//! ## Merge rules
//!
//! - TTL is taken from the API only when it is positive
//! - Priority follows the API when it reports one (or an explicit null)
//! - Content and CAA fields follow the record type's [`RecordPolicy`]
//! - Names coming back from the API are made zone-relative, apex as `@`
//!
//! [`RecordPolicy`]: crate::policy::RecordPolicy

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::import::{ImportId, ImportResolver};
use crate::model::{
    ApiRecord, DEFAULT_TTL, DesiredRecord, Field, ListFilter, ObservedRecord, RecordId,
    RecordPayload, RecordRef, RecordType,
};
use crate::naming;
use crate::policy::{RecordPolicy, policy_for};
use crate::traits::RecordApi;

/// Drives create/read/update/delete for one record at a time
///
/// Holds no state between calls; observed state is passed in and returned.
pub struct Reconciler {
    api: Arc<dyn RecordApi>,
}

impl Reconciler {
    /// Create a reconciler over a record API client
    pub fn new(api: Arc<dyn RecordApi>) -> Self {
        Self { api }
    }

    /// Create the desired record remotely
    ///
    /// Validation failures return before any API call. When the create
    /// response carries no usable ID the record is looked up by name and
    /// type.
    pub async fn create(&self, desired: &DesiredRecord) -> Result<ObservedRecord> {
        let policy = policy_for(desired.record_type);
        policy.validate(desired)?;

        let target = desired.target();
        let payload = policy.payload(desired);

        info!(
            "Creating {} record {} in {} via {}",
            desired.record_type,
            desired.name,
            target,
            self.api.provider_name()
        );

        let created = self.api.create_record(target, &payload).await?;
        let resolved = match created {
            Some(rec) if rec.usable_id().is_some() => rec,
            _ => {
                debug!("Create response carried no record ID, looking the record up");
                self.locate_created(desired, &payload).await?
            }
        };

        let id = resolved
            .usable_id()
            .ok_or_else(|| Error::not_found(format!("created {} record {} has no ID", desired.record_type, desired.name)))?;

        let mut observed = observed_from_desired(desired, id);
        merge_written(&mut observed, desired, Some(&resolved), policy);

        info!("Created {} record {} with ID {}", desired.record_type, desired.name, id);
        Ok(observed)
    }

    /// Refresh observed state from the API
    ///
    /// Returns `Ok(None)` when the record no longer exists remotely; the
    /// caller should stop tracking it.
    pub async fn read(&self, prior: &ObservedRecord) -> Result<Option<ObservedRecord>> {
        self.read_from(&prior.to_ref(), Some(prior)).await
    }

    /// Read a record known only by reference (used after import)
    pub async fn read_ref(&self, record: &RecordRef) -> Result<Option<ObservedRecord>> {
        self.read_from(record, None).await
    }

    /// Replace the remote record with the desired state
    pub async fn update(&self, desired: &DesiredRecord, prior: &ObservedRecord) -> Result<ObservedRecord> {
        let policy = policy_for(desired.record_type);
        policy.validate(desired)?;
        ensure_id(prior.id)?;

        let target = desired.target();
        let payload = policy.payload(desired);

        info!(
            "Updating {} record {} (ID {}) in {}",
            desired.record_type, desired.name, prior.id, target
        );

        let answered = match self.api.update_record(target, prior.id, &payload).await? {
            Some(rec) => Some(rec),
            None => {
                debug!("Update response was empty, fetching record {}", prior.id);
                match self.api.get_record(target, prior.id).await {
                    Ok(rec) => Some(rec),
                    Err(e) => {
                        debug!("Fetch after update failed, keeping desired values: {}", e);
                        None
                    }
                }
            }
        };

        let mut observed = observed_from_desired(desired, prior.id);
        merge_written(&mut observed, desired, answered.as_ref(), policy);
        Ok(observed)
    }

    /// Delete the remote record
    ///
    /// Errors from the API, including "not found", are returned unchanged.
    pub async fn delete(&self, prior: &ObservedRecord) -> Result<()> {
        ensure_id(prior.id)?;
        let target = prior.target();

        info!(
            "Deleting {} record {} (ID {}) in {}",
            prior.record_type, prior.name, prior.id, target
        );
        self.api.delete_record(target, prior.id).await
    }

    /// Resolve an import identifier and read the record it names
    pub async fn import(&self, raw: &str) -> Result<ObservedRecord> {
        let id: ImportId = raw.parse()?;
        info!("Importing record {}", raw);

        let resolver = ImportResolver::new(Arc::clone(&self.api));
        let record = resolver.resolve(&id).await?;

        self.read_ref(&record)
            .await?
            .ok_or_else(|| Error::not_found(format!("record {} from import {} does not exist", record.id, raw)))
    }

    async fn read_from(&self, record: &RecordRef, prior: Option<&ObservedRecord>) -> Result<Option<ObservedRecord>> {
        ensure_id(record.id)?;
        let target = record.target();

        let found = match self.api.get_record(target, record.id).await {
            Ok(rec) => Some(rec),
            Err(e) => {
                debug!("Get for record {} failed ({}), falling back to list", record.id, e);
                let mut filter = ListFilter::new();
                if let Some(name) = &record.name {
                    filter = filter.name(naming::to_api_name(name));
                }
                if let Some(record_type) = record.record_type {
                    filter = filter.record_type(record_type.as_str());
                }
                self.api
                    .list_records(target, &filter)
                    .await?
                    .into_iter()
                    .find(|rec| rec.id == Some(record.id))
            }
        };

        let Some(api) = found else {
            warn!("Record {} no longer exists in {}", record.id, target);
            return Ok(None);
        };

        let record_type = match api.record_type.parse::<RecordType>() {
            Ok(t) => t,
            Err(_) => record.record_type.ok_or_else(|| {
                Error::decode(format!("record {} has unsupported type {:?}", record.id, api.record_type), "")
            })?,
        };

        let mut observed = match prior {
            Some(prior) => prior.clone(),
            None => ObservedRecord {
                id: record.id,
                domain: record.domain.clone(),
                service: record.service.clone(),
                name: String::new(),
                record_type,
                content: Field::Unknown,
                ttl: DEFAULT_TTL,
                priority: Field::Unknown,
                caa_value: Field::Unknown,
                caa_flags: Field::Unknown,
                caa_tag: Field::Unknown,
            },
        };

        observed.name = naming::zone_relative(&api.name, &record.domain);
        observed.record_type = record_type;
        if let Some(ttl) = api.positive_ttl() {
            observed.ttl = ttl;
        }
        observed.priority = std::mem::take(&mut observed.priority).resync(api.priority.clone());
        policy_for(record_type).apply_read(&mut observed, &api);

        Ok(Some(observed))
    }

    /// Find a just-created record by name and type, preferring the one whose
    /// content matches what was sent
    async fn locate_created(&self, desired: &DesiredRecord, payload: &RecordPayload) -> Result<ApiRecord> {
        let target = desired.target();
        let filter = ListFilter::new()
            .name(payload.name.clone())
            .record_type(payload.record_type.as_str());

        let wanted_name = naming::zone_relative(&desired.name, &desired.domain);
        let candidates: Vec<ApiRecord> = self
            .api
            .list_records(target, &filter)
            .await?
            .into_iter()
            .filter(|rec| rec.usable_id().is_some())
            .filter(|rec| rec.record_type.eq_ignore_ascii_case(payload.record_type.as_str()))
            .filter(|rec| naming::zone_relative(&rec.name, &desired.domain) == wanted_name)
            .collect();

        if let Some(exact) = candidates.iter().find(|rec| sent_matches(rec, payload)) {
            return Ok(exact.clone());
        }

        match candidates.into_iter().next() {
            Some(first) => {
                warn!(
                    "No {} record {} matched the sent content, using first result (ID {:?})",
                    desired.record_type, desired.name, first.id
                );
                Ok(first)
            }
            None => Err(Error::not_found(format!(
                "created {} record {} could not be found in {}",
                desired.record_type, desired.name, target
            ))),
        }
    }
}

fn ensure_id(id: RecordId) -> Result<()> {
    if id == 0 {
        return Err(Error::validation("record ID must be non-zero"));
    }
    Ok(())
}

/// True if the API record carries the content (or CAA value) that was sent
fn sent_matches(rec: &ApiRecord, payload: &RecordPayload) -> bool {
    if rec.content.as_ref().value().is_some_and(|c| *c == payload.content) {
        return true;
    }
    match (&payload.caa_value, rec.caa_value.as_ref().value()) {
        (Some(sent), Some(got)) => sent == got,
        _ => false,
    }
}

fn observed_from_desired(desired: &DesiredRecord, id: RecordId) -> ObservedRecord {
    ObservedRecord {
        id,
        domain: desired.domain.clone(),
        service: desired.service.clone(),
        name: desired.name.clone(),
        record_type: desired.record_type,
        content: Field::from(desired.content.clone()),
        ttl: desired.ttl,
        priority: Field::from(desired.priority),
        caa_value: Field::from(desired.caa_value.clone()),
        caa_flags: Field::from(desired.caa_flags),
        caa_tag: Field::from(desired.caa_tag.clone()),
    }
}

fn merge_written(
    observed: &mut ObservedRecord,
    desired: &DesiredRecord,
    api: Option<&ApiRecord>,
    policy: &dyn RecordPolicy,
) {
    if let Some(api) = api {
        if let Some(ttl) = api.positive_ttl() {
            observed.ttl = ttl;
        }
        observed.priority = std::mem::take(&mut observed.priority).resync(api.priority.clone());
    }
    policy.apply_written(observed, desired, api);
}
